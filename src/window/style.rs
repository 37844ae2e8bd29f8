//! Win32 style bits and the pure transforms applied to them
//!
//! Values are kept here as plain integers so the read-modify-write logic can
//! be exercised without a window manager.

// Window styles (GWL_STYLE)
pub const WS_CAPTION: isize = 0x00C0_0000;
pub const WS_THICKFRAME: isize = 0x0004_0000;
pub const WS_MINIMIZEBOX: isize = 0x0002_0000;
pub const WS_MAXIMIZEBOX: isize = 0x0001_0000;
pub const WS_SYSMENU: isize = 0x0008_0000;
pub const WS_BORDER: isize = 0x0080_0000;

/// `WS_OVERLAPPEDWINDOW`, the style of a normal decorated top-level window
pub const WS_OVERLAPPEDWINDOW: isize =
    WS_CAPTION | WS_SYSMENU | WS_THICKFRAME | WS_MINIMIZEBOX | WS_MAXIMIZEBOX;

/// Every bit `strip_borders` removes; `with_borders` restores a subset of these
pub const BORDER_BITS: isize =
    WS_CAPTION | WS_THICKFRAME | WS_MINIMIZEBOX | WS_MAXIMIZEBOX | WS_SYSMENU | WS_BORDER;

// Extended window styles (GWL_EXSTYLE)
pub const WS_EX_TRANSPARENT: isize = 0x0000_0020;
pub const WS_EX_LAYERED: isize = 0x0008_0000;
pub const WS_EX_COMPOSITED: isize = 0x0200_0000;

/// Layered-window attribute flag: apply the constant alpha
pub const LWA_ALPHA: u32 = 0x0000_0002;

/// Which window long a style read or write targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleIndex {
    Style,
    ExStyle,
}

impl StyleIndex {
    pub fn raw(self) -> i32 {
        match self {
            StyleIndex::Style => -16,   // GWL_STYLE
            StyleIndex::ExStyle => -20, // GWL_EXSTYLE
        }
    }
}

/// `ShowWindow` commands used by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowCommand {
    Hide,
    Show,
    Maximize,
    Minimize,
    Restore,
}

impl ShowCommand {
    pub fn raw(self) -> i32 {
        match self {
            ShowCommand::Hide => 0,
            ShowCommand::Show => 5,
            ShowCommand::Maximize => 3,
            ShowCommand::Minimize => 6,
            ShowCommand::Restore => 9,
        }
    }
}

/// `GetSystemMetrics` indices used by the shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SystemMetric {
    ScreenWidth,
    ScreenHeight,
    VirtualX,
    VirtualY,
    VirtualWidth,
    VirtualHeight,
}

impl SystemMetric {
    pub fn raw(self) -> i32 {
        match self {
            SystemMetric::ScreenWidth => 0,    // SM_CXSCREEN
            SystemMetric::ScreenHeight => 1,   // SM_CYSCREEN
            SystemMetric::VirtualX => 76,      // SM_XVIRTUALSCREEN
            SystemMetric::VirtualY => 77,      // SM_YVIRTUALSCREEN
            SystemMetric::VirtualWidth => 78,  // SM_CXVIRTUALSCREEN
            SystemMetric::VirtualHeight => 79, // SM_CYVIRTUALSCREEN
        }
    }
}

/// Drop caption, frame, system menu and min/max boxes
pub fn strip_borders(style: isize) -> isize {
    style & !BORDER_BITS
}

/// Put back the border bits in `removed`; anything outside `BORDER_BITS` is ignored
pub fn with_borders(style: isize, removed: isize) -> isize {
    style | (removed & BORDER_BITS)
}

pub fn with_layered(ex_style: isize) -> isize {
    ex_style | WS_EX_LAYERED
}

/// Layered, click-through and composited, as needed for a see-through background
pub fn with_transparent_background(ex_style: isize) -> isize {
    ex_style | WS_EX_LAYERED | WS_EX_TRANSPARENT | WS_EX_COMPOSITED
}
