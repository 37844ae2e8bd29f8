//! Build script to embed Windows resource metadata into executables
//! Also embeds `assets/app.ico` as icon resource 1 when it exists, so
//! `icon_id: 1` works for both the window and the tray.

fn main() {
    println!("cargo:rerun-if-changed=assets/app.ico");

    #[cfg(windows)]
    {
        let mut res = winresource::WindowsResource::new();

        res.set("ProductName", "Glide Shell");
        res.set("FileDescription", "Glide.Demo");
        res.set("InternalName", "Glide.Demo");
        res.set("OriginalFilename", "glide_demo.exe");
        res.set("ProductVersion", env!("CARGO_PKG_VERSION"));
        res.set("FileVersion", env!("CARGO_PKG_VERSION"));

        if std::path::Path::new("assets/app.ico").exists() {
            res.set_icon_with_id("assets/app.ico", "1");
        }

        if let Err(e) = res.compile() {
            eprintln!("Warning: Failed to compile Windows resources: {}", e);
        }
    }
}
