use futures::future::join_all;
use reqwest::Client;
use shared::domain::{EyeColor, HairColor};

use crate::error::ClientError;
use crate::http::{decode_json, normalize_base_url};

/// One category's outcome in a fan-out: a value or the error that category
/// produced, never blocking the others.
#[derive(Debug)]
pub struct CategoryStat<C, T> {
    pub category: C,
    pub outcome: Result<T, ClientError>,
}

/// Aggregated demographic statistics, one entry per requested category.
#[derive(Debug, Default)]
pub struct DemographySnapshot {
    pub hair: Vec<CategoryStat<HairColor, f64>>,
    pub eye: Vec<CategoryStat<EyeColor, i64>>,
}

/// Client for the demography service.
pub struct DemographyClient {
    http: Client,
    base_url: String,
}

impl DemographyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: normalize_base_url(base_url),
        }
    }

    /// GET /demography/hair-color/{color}/percentage: bare numeric body.
    pub async fn hair_color_percentage(&self, color: HairColor) -> Result<f64, ClientError> {
        let url = format!(
            "{}/demography/hair-color/{}/percentage",
            self.base_url,
            color.as_str()
        );
        let response = self.http.get(url).send().await?;
        decode_json(response).await
    }

    /// GET /demography/eye-color/{color}: bare integer body.
    pub async fn eye_color_count(&self, color: EyeColor) -> Result<i64, ClientError> {
        let url = format!("{}/demography/eye-color/{}", self.base_url, color.as_str());
        let response = self.http.get(url).send().await?;
        decode_json(response).await
    }

    /// Fans out one request per category, concurrently, and joins on all of
    /// them. Every outcome is recorded independently; a failing category
    /// neither blocks nor discards the rest, and the snapshot is returned
    /// only once all requests have settled.
    pub async fn gather(
        &self,
        hair_colors: &[HairColor],
        eye_colors: &[EyeColor],
    ) -> DemographySnapshot {
        let hair = hair_colors.iter().map(|&color| async move {
            CategoryStat {
                category: color,
                outcome: self.hair_color_percentage(color).await,
            }
        });
        let eye = eye_colors.iter().map(|&color| async move {
            CategoryStat {
                category: color,
                outcome: self.eye_color_count(color).await,
            }
        });

        let (hair, eye) = tokio::join!(join_all(hair), join_all(eye));
        DemographySnapshot { hair, eye }
    }
}
