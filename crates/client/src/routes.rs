use estate_cms_core::SectionName;

/// Endpoints of the content backend, relative to the configured base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    base_url: String,
}

impl Routes {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET` and `POST` target for one section document.
    pub fn section(&self, section: &SectionName) -> String {
        format!("{}/api/{section}", self.base_url)
    }

    /// Multipart image upload.
    pub fn upload(&self) -> String {
        format!("{}/api/upload", self.base_url)
    }

    pub fn delete_image(&self) -> String {
        format!("{}/api/delete-image", self.base_url)
    }
}
