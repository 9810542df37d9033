mod common;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::Arc;

use common::MemoryObjects;
use order_menu::config::CompressionConfig;
use order_menu::errors::AppError;
use order_menu::repositories::ObjectStore;
use order_menu::services::ImageUploadService;

fn gradient_png(width: u32, height: u32) -> Vec<u8> {
    let mut state: u32 = 0x9e37_79b9;
    let img: RgbImage = ImageBuffer::from_fn(width, height, |x, y| {
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        Rgb([(x % 256) as u8, (y % 256) as u8, (state & 0xff) as u8])
    });
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[tokio::test]
async fn test_large_png_is_compressed_and_stored() {
    let objects = Arc::new(MemoryObjects::default());
    let store: Arc<dyn ObjectStore> = objects.clone();
    let config = CompressionConfig::default();
    let service = ImageUploadService::new(Some(store), &config);

    let original = gradient_png(1000, 800);
    assert!(original.len() as u64 > config.max_size_bytes());

    let url = service
        .upload("photo.png", "image/png", original.clone())
        .await
        .unwrap()
        .expect("store is configured");

    assert!(url.starts_with("https://test.supabase.co/storage/v1/object/public/dish-images/dishes/"));
    assert!(url.ends_with(".jpg"));

    let objects_guard = objects.objects.lock().unwrap();
    assert_eq!(objects_guard.len(), 1);
    let (body, content_type) = objects_guard.values().next().unwrap();
    assert_eq!(content_type, "image/jpeg");
    assert!(body.len() < original.len());

    let stored = image::load_from_memory(body).unwrap();
    assert!(stored.width() <= config.max_width);
    assert!(stored.height() <= config.max_height);
}

#[tokio::test]
async fn test_uploaded_image_can_be_deleted_by_url() {
    let objects = Arc::new(MemoryObjects::default());
    let store: Arc<dyn ObjectStore> = objects.clone();
    let service = ImageUploadService::new(Some(store), &CompressionConfig::default());

    let url = service
        .upload("small.png", "image/png", gradient_png(8, 8))
        .await
        .unwrap()
        .unwrap();
    assert!(url.ends_with(".png"));

    assert!(service.delete(&url).await);
    assert!(objects.objects.lock().unwrap().is_empty());
    assert!(!service.delete("https://elsewhere.example.com/a.png").await);
}

#[tokio::test]
async fn test_png_data_url_is_compressed_and_stored() {
    let objects = Arc::new(MemoryObjects::default());
    let store: Arc<dyn ObjectStore> = objects.clone();
    let config = CompressionConfig::default();
    let service = ImageUploadService::new(Some(store), &config);

    let original = gradient_png(1000, 800);
    assert!(original.len() as u64 > config.max_size_bytes());
    let data_url = format!("data:image/png;base64,{}", STANDARD.encode(&original));

    let url = service
        .upload_data_url(&data_url)
        .await
        .unwrap()
        .expect("store is configured");
    assert!(url.ends_with(".jpg"));

    let objects_guard = objects.objects.lock().unwrap();
    let (body, content_type) = objects_guard.values().next().unwrap();
    assert_eq!(content_type, "image/jpeg");
    let stored = image::load_from_memory(body).unwrap();
    assert!(stored.width() <= config.max_width);
    assert!(stored.height() <= config.max_height);
}

#[tokio::test]
async fn test_non_image_data_url_is_rejected() {
    let objects = Arc::new(MemoryObjects::default());
    let store: Arc<dyn ObjectStore> = objects.clone();
    let service = ImageUploadService::new(Some(store), &CompressionConfig::default());

    let data_url = format!("data:text/plain;base64,{}", STANDARD.encode(b"hello"));
    let err = service.upload_data_url(&data_url).await.unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert!(objects.objects.lock().unwrap().is_empty());
}
