//! `WindowApi` over user32 / dwmapi
//!
//! 64-bit builds use the `*LongPtrW` accessors, 32-bit builds the `*LongW`
//! ones. Both read and write the same bits.

use super::native::WindowApi;
use super::style::{ShowCommand, StyleIndex, SystemMetric};
use crate::error::ShellError;
use crate::surface::WindowHandle;
use windows::Win32::Foundation::{SetLastError, COLORREF, HWND, WIN32_ERROR};
use windows::Win32::Graphics::Dwm::DwmExtendFrameIntoClientArea;
use windows::Win32::Graphics::Gdi::UpdateWindow;
use windows::Win32::UI::Controls::MARGINS;
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SetLayeredWindowAttributes, SetWindowPos, ShowWindow, ShowWindowAsync,
    GET_CLASS_LONG_INDEX, LWA_ALPHA, SHOW_WINDOW_CMD, SWP_FRAMECHANGED, SWP_NOACTIVATE,
    SWP_NOMOVE, SWP_NOSIZE, SWP_NOZORDER, SYSTEM_METRICS_INDEX, WINDOW_LONG_PTR_INDEX,
};

#[cfg(target_pointer_width = "64")]
use windows::Win32::UI::WindowsAndMessaging::{
    GetWindowLongPtrW, SetClassLongPtrW, SetWindowLongPtrW,
};

#[cfg(target_pointer_width = "32")]
use windows::Win32::UI::WindowsAndMessaging::{GetWindowLongW, SetClassLongW, SetWindowLongW};

/// GCLP_HBRBACKGROUND
const CLASS_BACKGROUND_BRUSH: GET_CLASS_LONG_INDEX = GET_CLASS_LONG_INDEX(-10);

/// Zero-sized: all state lives in the OS
#[derive(Debug, Default, Clone, Copy)]
pub struct Win32Api;

fn hwnd(window: WindowHandle) -> HWND {
    HWND(window.0)
}

fn long_index(index: StyleIndex) -> WINDOW_LONG_PTR_INDEX {
    WINDOW_LONG_PTR_INDEX(index.raw())
}

#[cfg(target_pointer_width = "64")]
unsafe fn get_window_long(window: HWND, index: WINDOW_LONG_PTR_INDEX) -> isize {
    GetWindowLongPtrW(window, index)
}

#[cfg(target_pointer_width = "32")]
unsafe fn get_window_long(window: HWND, index: WINDOW_LONG_PTR_INDEX) -> isize {
    GetWindowLongW(window, index) as isize
}

#[cfg(target_pointer_width = "64")]
unsafe fn set_window_long(window: HWND, index: WINDOW_LONG_PTR_INDEX, value: isize) -> isize {
    SetWindowLongPtrW(window, index, value)
}

#[cfg(target_pointer_width = "32")]
unsafe fn set_window_long(window: HWND, index: WINDOW_LONG_PTR_INDEX, value: isize) -> isize {
    SetWindowLongW(window, index, value as i32) as isize
}

#[cfg(target_pointer_width = "64")]
unsafe fn set_class_long(window: HWND, index: GET_CLASS_LONG_INDEX, value: isize) -> usize {
    SetClassLongPtrW(window, index, value)
}

#[cfg(target_pointer_width = "32")]
unsafe fn set_class_long(window: HWND, index: GET_CLASS_LONG_INDEX, value: isize) -> usize {
    SetClassLongW(window, index, value as i32) as usize
}

/// A zero return from the Set*Long family is only a failure if the last
/// error was set by the call
fn last_error_since_reset(call: &'static str) -> Result<(), ShellError> {
    let error = windows::core::Error::from_win32();
    if error.code().is_err() {
        Err(ShellError::native(call, error))
    } else {
        Ok(())
    }
}

impl WindowApi for Win32Api {
    fn get_long(&self, window: WindowHandle, index: StyleIndex) -> isize {
        unsafe { get_window_long(hwnd(window), long_index(index)) }
    }

    fn set_long(
        &self,
        window: WindowHandle,
        index: StyleIndex,
        value: isize,
    ) -> Result<isize, ShellError> {
        unsafe {
            SetLastError(WIN32_ERROR(0));
            let previous = set_window_long(hwnd(window), long_index(index), value);
            if previous == 0 {
                last_error_since_reset("SetWindowLong")?;
            }
            Ok(previous)
        }
    }

    fn set_layered_alpha(&self, window: WindowHandle, alpha: u8) -> Result<(), ShellError> {
        unsafe { SetLayeredWindowAttributes(hwnd(window), COLORREF(0), alpha, LWA_ALPHA) }
            .map_err(|e| ShellError::native("SetLayeredWindowAttributes", e))
    }

    fn clear_background_brush(&self, window: WindowHandle) -> Result<(), ShellError> {
        unsafe {
            SetLastError(WIN32_ERROR(0));
            if set_class_long(hwnd(window), CLASS_BACKGROUND_BRUSH, 0) == 0 {
                last_error_since_reset("SetClassLong")?;
            }
        }
        Ok(())
    }

    fn extend_frame_into_client(&self, window: WindowHandle) -> Result<(), ShellError> {
        let margins = MARGINS {
            cxLeftWidth: -1,
            cxRightWidth: -1,
            cyTopHeight: -1,
            cyBottomHeight: -1,
        };
        unsafe { DwmExtendFrameIntoClientArea(hwnd(window), &margins) }
            .map_err(|e| ShellError::native("DwmExtendFrameIntoClientArea", e))
    }

    fn move_to(&self, window: WindowHandle, x: i32, y: i32) -> Result<(), ShellError> {
        unsafe {
            SetWindowPos(
                hwnd(window),
                HWND::default(),
                x,
                y,
                0,
                0,
                SWP_NOSIZE | SWP_NOZORDER,
            )
        }
        .map_err(|e| ShellError::native("SetWindowPos", e))
    }

    fn refresh_frame(&self, window: WindowHandle) -> Result<(), ShellError> {
        unsafe {
            SetWindowPos(
                hwnd(window),
                HWND::default(),
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOZORDER | SWP_NOACTIVATE | SWP_FRAMECHANGED,
            )
        }
        .map_err(|e| ShellError::native("SetWindowPos", e))
    }

    fn show(&self, window: WindowHandle, command: ShowCommand) -> bool {
        unsafe { ShowWindow(hwnd(window), SHOW_WINDOW_CMD(command.raw())) }.as_bool()
    }

    fn show_async(&self, window: WindowHandle, command: ShowCommand) -> bool {
        unsafe { ShowWindowAsync(hwnd(window), SHOW_WINDOW_CMD(command.raw())) }.as_bool()
    }

    fn update(&self, window: WindowHandle) -> Result<(), ShellError> {
        if unsafe { UpdateWindow(hwnd(window)) }.as_bool() {
            Ok(())
        } else {
            Err(ShellError::native("UpdateWindow", "window not updated"))
        }
    }

    fn metric(&self, metric: SystemMetric) -> i32 {
        unsafe { GetSystemMetrics(SYSTEM_METRICS_INDEX(metric.raw())) }
    }
}
