pub mod error;
pub mod gateway;
pub mod mirror;
pub mod overview;
pub mod reconcile;
pub mod submission;
pub mod wizard;


pub use error::{CatalogError, Operation, Result};
pub use gateway::{BulkDeleteReport, CatalogGateway};
pub use mirror::{ConsoleMirrors, Mirror};
pub use overview::{search_items, OverviewCounts, OverviewRow, Selection};
pub use reconcile::{decode_document, decode_user, encode_submission, validate_submission};
pub use submission::{CatalogSubmission, CommonFields};
pub use wizard::{SubmissionWizard, WizardAction, WizardError, WizardStep};
