// src/backend/mod.rs

pub mod api;

#[cfg(feature = "backend-x11")]
pub mod x11;
#[cfg(feature = "backend-x11")]
pub mod x11_gl;

use api::DriverDescriptor;

/// Registered drivers, in autoprobe order.
#[cfg(feature = "backend-x11")]
pub static DRIVERS: &[&DriverDescriptor] = &[&x11_gl::X11_GL_DRIVER, &x11::X11_WINDOW_DRIVER];

#[cfg(not(feature = "backend-x11"))]
pub static DRIVERS: &[&DriverDescriptor] = &[];

pub fn find_driver(name: &str) -> Option<&'static DriverDescriptor> {
    DRIVERS.iter().copied().find(|d| d.name == name)
}
