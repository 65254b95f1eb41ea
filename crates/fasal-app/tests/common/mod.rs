#![allow(dead_code)]

use std::io::Cursor;

use async_trait::async_trait;
use fasal_core::{Coordinate, Error, FrameGrabber, LocationSensor, Result};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

/// Surface logs with `RUST_LOG=fasal_app=debug cargo test`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub struct FixedSensor(pub Coordinate);

#[async_trait]
impl LocationSensor for FixedSensor {
    async fn current_position(&self) -> Result<Coordinate> {
        Ok(self.0)
    }
}

pub struct DeniedSensor;

#[async_trait]
impl LocationSensor for DeniedSensor {
    async fn current_position(&self) -> Result<Coordinate> {
        Err(Error::Network("User denied Geolocation".to_string()))
    }
}

pub struct StillCamera(pub &'static str);

impl FrameGrabber for StillCamera {
    fn grab_frame(&self) -> Option<String> {
        Some(self.0.to_string())
    }
}

pub fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([shade, 140, 60]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
