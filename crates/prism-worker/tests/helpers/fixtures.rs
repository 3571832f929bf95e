use image::{ImageFormat, Rgb, RgbImage};
use prism_core::UploadRecord;
use serde_json::{json, Value};
use std::io::Cursor;

use super::SOURCE_BUCKET;

pub fn record(key: &str) -> UploadRecord {
    UploadRecord::new(SOURCE_BUCKET, key)
}

/// A storage notification announcing the creation of `keys` (already encoded).
pub fn notification(keys: &[&str]) -> Value {
    let records: Vec<Value> = keys
        .iter()
        .map(|key| {
            json!({
                "eventVersion": "2.1",
                "eventSource": "aws:s3",
                "eventName": "ObjectCreated:Put",
                "s3": {
                    "bucket": { "name": SOURCE_BUCKET },
                    "object": { "key": key, "size": 10 }
                }
            })
        })
        .collect();
    json!({ "Records": records })
}

/// A small solid-colour PNG.
pub fn create_test_png(width: u32, height: u32, pixel: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(pixel));
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);
    img.write_to(&mut cursor, ImageFormat::Png)
        .expect("encode test png");
    buffer
}
