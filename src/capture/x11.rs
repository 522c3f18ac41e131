//! X11 screen capture backend.
//!
//! Grabs the root window of the default screen with `XGetImage` and converts
//! the ZPixmap into packed RGB8.

use std::os::raw::{c_int, c_void};
use std::ptr;

use x11::xlib;

use crate::capture::{Error, Result, ScreenCapture, ScreenImage};

/// Screen capture through a plain Xlib display connection.
pub struct X11Capture {
    display: *mut xlib::Display,
    screen: c_int,
    image: Option<ScreenImage>,
}

impl X11Capture {
    /// Connect to the display named by `DISPLAY`.
    pub fn open() -> Result<Self> {
        let display = unsafe { xlib::XOpenDisplay(ptr::null()) };
        if display.is_null() {
            return Err(Error::DisplayUnavailable(
                "XOpenDisplay failed (is DISPLAY set?)".into(),
            ));
        }
        let screen = unsafe { xlib::XDefaultScreen(display) };
        Ok(X11Capture {
            display,
            screen,
            image: None,
        })
    }

    fn grab(&mut self) -> Result<ScreenImage> {
        let image = unsafe {
            let root = xlib::XRootWindow(self.display, self.screen);
            let width = xlib::XDisplayWidth(self.display, self.screen);
            let height = xlib::XDisplayHeight(self.display, self.screen);
            xlib::XGetImage(
                self.display,
                root,
                0,
                0,
                width as u32,
                height as u32,
                xlib::XAllPlanes(),
                xlib::ZPixmap,
            )
        };
        if image.is_null() {
            return Err(Error::CaptureFailed("XGetImage returned no image".into()));
        }

        let converted = unsafe { convert_zpixmap(image) };
        unsafe { destroy_image(image) };
        converted
    }
}

impl ScreenCapture for X11Capture {
    fn name(&self) -> &'static str {
        "x11"
    }

    fn update_screenshot(&mut self) -> Result<()> {
        let image = self.grab()?;
        self.image = Some(image);
        Ok(())
    }

    fn image(&mut self) -> Result<ScreenImage> {
        if self.image.is_none() {
            self.update_screenshot()?;
        }
        match &self.image {
            Some(image) => Ok(image.clone()),
            None => Err(Error::CaptureFailed("no screenshot available".into())),
        }
    }
}

impl Drop for X11Capture {
    fn drop(&mut self) {
        unsafe {
            xlib::XCloseDisplay(self.display);
        }
    }
}

/// Convert a 32-bits-per-pixel ZPixmap into packed RGB8.
///
/// Assumes the common TrueColor layout with 0xff0000/0x00ff00/0x0000ff
/// channel masks.
unsafe fn convert_zpixmap(image: *mut xlib::XImage) -> Result<ScreenImage> {
    let width = (*image).width as usize;
    let height = (*image).height as usize;
    let bytes_per_line = (*image).bytes_per_line as usize;
    let bits_per_pixel = (*image).bits_per_pixel;

    if bits_per_pixel != 32 {
        return Err(Error::CaptureFailed(format!(
            "unsupported pixel format: {bits_per_pixel} bits per pixel"
        )));
    }

    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = (*image).data.add(y * bytes_per_line);
        for x in 0..width {
            let value = ptr::read_unaligned(row.add(x * 4) as *const u32);
            data.push(((value >> 16) & 0xff) as u8);
            data.push(((value >> 8) & 0xff) as u8);
            data.push((value & 0xff) as u8);
        }
    }

    Ok(ScreenImage::new(width as u32, height as u32, data))
}

/// Free an image allocated by `XGetImage`.
///
/// `XDestroyImage` is a macro in Xlib; for images from `XGetImage` it frees
/// the pixel buffer with `free()` and the struct with `XFree()`.
unsafe fn destroy_image(image: *mut xlib::XImage) {
    if !(*image).data.is_null() {
        libc::free((*image).data as *mut libc::c_void);
        (*image).data = ptr::null_mut();
    }
    xlib::XFree(image as *mut c_void);
}
