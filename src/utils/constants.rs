/// Sentinel used for records without a resolvable planning area or region
pub const NOT_SPECIFIED: &str = "NOT SPECIFIED";

/// Technology bucket for anything outside the allowed list
pub const OTHER_TECHNOLOGY: &str = "Other";

/// Label for blank categorical fields (system type, integrator)
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Root label of the hierarchy charts
pub const DEFAULT_COUNTRY: &str = "Singapore";

/// System names that are portfolio aggregates rather than single sites
pub const DEFAULT_DISALLOWED_SYSTEMS: [&str; 5] = [
    "SolarNova2",
    "SolarNova3",
    "HDB Phase 1 Solar Leasing",
    "HDB Phase 2 Solar Leasing",
    "HDB Phase 3 Solar Leasing",
];

pub const DEFAULT_TECHNOLOGY_TYPES: [&str; 7] = [
    "Amorphous silicon",
    "CIGS",
    "Monocrystalline HIT",
    "Monocrystalline all-back contact",
    "Monocrystalline silicon",
    "Polycrystalline silicon",
    "multi-crystalline",
];

/// Boundary attribute names (URA Master Plan 2014 planning area layer)
pub const FIELD_PLANNING_AREA: &str = "PLN_AREA_N";
pub const FIELD_REGION: &str = "REGION_N";
pub const FIELD_SHAPE_AREA: &str = "SHAPE_Area";

/// System database columns
pub const COLUMN_COMMISSIONED: &str = "Commissioned";
pub const COLUMN_SYSTEM_SIZE: &str = "System size";
pub const COLUMN_TILT: &str = "Tilt";

/// Correction table columns
pub const COLUMN_LOCATION_LISTED: &str = "Listed";
pub const COLUMN_SYSTEM_NAME: &str = "System name";
pub const COLUMN_ACTUAL: &str = "Actual";

/// Default input file names
pub const DEFAULT_BOUNDARY_ARCHIVE: &str = "master-plan-2014-planning-area-boundary-web-shp.zip";
pub const DEFAULT_SYSTEM_DATABASE: &str = "system_database.csv";
pub const DEFAULT_LOCATION_CORRECTIONS: &str = "location_correct.csv";
pub const DEFAULT_NAME_CORRECTIONS: &str = "name_correct.csv";
pub const DEFAULT_CONFIG_FILE: &str = "solar-analysis.toml";
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Exported tables
pub const SYSTEMS_PARQUET: &str = "systems.parquet";
pub const PLANNING_AREAS_PARQUET: &str = "planning_areas.parquet";
pub const AREA_SERIES_PARQUET: &str = "cumulative_by_area.parquet";
pub const TECHNOLOGY_SERIES_PARQUET: &str = "cumulative_by_technology.parquet";

/// Environment override prefix, e.g. SOLAR__OUTPUT_DIR
pub const ENV_PREFIX: &str = "SOLAR";

/// Float tolerance for capacity reconciliation checks (kWp)
pub const CAPACITY_TOLERANCE: f64 = 1e-6;

/// Processing defaults
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
