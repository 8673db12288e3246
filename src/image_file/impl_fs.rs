use crate::device_camera::interface::CapturedImage;
use crate::error::PipelineError;
use crate::image_file::interface::ImageFiles;

pub struct ImageFilesFs;

impl ImageFiles for ImageFilesFs {
    fn read_bytes(&self, image: &CapturedImage) -> Result<Vec<u8>, PipelineError> {
        std::fs::read(image.path()).map_err(|e| PipelineError::Io {
            uri: image.uri.clone(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF]).unwrap();

        let bytes = ImageFilesFs
            .read_bytes(&CapturedImage::from_path(&path))
            .unwrap();

        assert_eq!(bytes, vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_missing_file_is_io_error_with_uri() {
        let dir = tempfile::tempdir().unwrap();
        let image = CapturedImage::from_path(&dir.path().join("gone.jpg"));

        match ImageFilesFs.read_bytes(&image) {
            Err(PipelineError::Io { uri, .. }) => assert_eq!(uri, image.uri),
            other => panic!("Unexpected result: {:?}", other),
        }
    }
}
