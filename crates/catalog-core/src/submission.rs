use catalog_models::{CatalogKind, CatalogVariant, Categories, Season};

/// Fields shared by both catalog kinds, as typed into the first wizard step
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommonFields {
    pub title: String,
    pub trailer_url: String,
    pub poster_url: String,
    pub banner_url: String,
    pub synopsis: String,
    pub release_date: String,
    pub categories: Categories,
}

/// A finished entity ready for the reconciler
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSubmission {
    pub common: CommonFields,
    pub variant: CatalogVariant,
}

impl CatalogSubmission {
    pub fn movie(common: CommonFields, download_url: impl Into<String>, fill: bool) -> Self {
        Self {
            common,
            variant: CatalogVariant::Movie {
                download_url: download_url.into(),
                fill,
            },
        }
    }

    pub fn series(common: CommonFields, series_data: Vec<Season>) -> Self {
        Self {
            common,
            variant: CatalogVariant::Series { series_data },
        }
    }

    pub fn kind(&self) -> CatalogKind {
        self.variant.kind()
    }
}
