use actix_multipart::Field;
use actix_web::{error, Error};
use futures::StreamExt;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use uuid::Uuid;

static MEDIA_DIR: OnceCell<PathBuf> = OnceCell::new();

/// init MUST have been called before this is used.
#[inline(always)]
pub fn get_media_dir() -> &'static Path {
    unsafe { MEDIA_DIR.get_unchecked() }
}

pub fn init() {
    let dir = PathBuf::from(std::env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".to_owned()));
    std::fs::create_dir_all(&dir).expect("MEDIA_DIR could not be created.");
    MEDIA_DIR.set(dir).ok();
}

/// Reads an uploaded image part to completion and stores it under the media
/// dir with a generated name. An empty part (no file selected) is Ok(None).
pub async fn save_image_field(field: &mut Field) -> Result<Option<String>, Error> {
    let filename = field
        .content_disposition()
        .get_filename()
        .unwrap_or("")
        .to_owned();
    if filename.is_empty() {
        // Browsers send an empty part for an untouched file input.
        while field.next().await.is_some() {}
        return Ok(None);
    }

    if field.content_type().type_() != mime::IMAGE {
        return Err(error::ErrorBadRequest("Upload is not an image."));
    }

    let mut buf: Vec<u8> = Vec::with_capacity(1024);
    while let Some(chunk) = field.next().await {
        let bytes = chunk.map_err(|e| {
            log::error!("save_image_field: multipart read error: {}", e);
            error::ErrorInternalServerError("error reading upload data")
        })?;
        buf.extend(bytes);
    }
    if buf.is_empty() {
        return Ok(None);
    }

    let ext = Path::new(&filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_else(|| field.content_type().subtype().as_str());
    let name = format!("{}.{}", Uuid::new_v4(), ext);
    let path = get_media_dir().join(&name);
    std::fs::write(&path, &buf).map_err(|e| {
        log::error!("save_image_field: write {}: {}", path.display(), e);
        error::ErrorInternalServerError("could not store upload")
    })?;

    Ok(Some(name))
}
