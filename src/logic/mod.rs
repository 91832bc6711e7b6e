pub mod canonical;
pub mod classify;
pub mod compare;
pub mod identity;
pub mod migrate;
pub mod paths;
pub mod session;

pub use canonical::{canonical_json, fingerprint, values_equal};
pub use classify::classify_unit;
pub use compare::{project_fields, ComparisonEngine};
pub use identity::{build_identity_maps, identifier_of, IdentityMaps};
pub use migrate::MigrationBuilder;
pub use paths::{collect_paths, get_value_at_path, set_value_at_path};
pub use session::SessionAssembler;
