use std::path::{Path, PathBuf};

/// Product pages dumped per listing page
pub const PRODUCT_DUMPS_PER_PAGE: usize = 5;

/// Writes raw HTML of fetched pages for offline selector debugging
///
/// Disabled when no directory is configured. Write failures are logged and
/// otherwise ignored.
#[derive(Debug, Clone, Default)]
pub struct HtmlDumper {
    dir: Option<PathBuf>,
}

impl HtmlDumper {
    pub fn new(dir: Option<&str>) -> Self {
        Self {
            dir: dir.map(PathBuf::from),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// `debug_page_<n>.html`
    pub fn listing_name(page: u32) -> String {
        format!("debug_page_{}.html", page)
    }

    /// `debug_product_<n>_<i>.html`, or None past the per-page quota
    pub fn product_name(page: u32, index: usize) -> Option<String> {
        (index < PRODUCT_DUMPS_PER_PAGE).then(|| format!("debug_product_{}_{}.html", page, index + 1))
    }

    pub async fn dump(&self, file_name: &str, body: &str) {
        let Some(dir) = &self.dir else {
            return;
        };

        if let Err(e) = write(dir, file_name, body).await {
            tracing::warn!("Could not write debug dump {}: {}", file_name, e);
        } else {
            tracing::debug!("Saved {}", dir.join(file_name).display());
        }
    }
}

async fn write(dir: &Path, file_name: &str, body: &str) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(file_name), body).await
}
