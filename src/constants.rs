pub const NUCLEOTIDES: [u8; 5] = [b'A', b'C', b'G', b'T', b'U'];

/// Context length of a mutation channel
pub const TRIPLET_LEN: usize = 3;

/// Largest number of descriptors sent in a single annotation request
pub const DEFAULT_BATCH_SIZE: usize = 150;

/// Tolerance on the sum of spectrum frequencies
pub const DEFAULT_TOLERANCE: f64 = 1.0e-6;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENSEMBL_RECODER_URL: &str = "https://rest.ensembl.org/variant_recoder/homo_sapiens";

pub const VCF_SOURCE: &str = "mutsim";
pub const VCF_SAMPLE: &str = "SimulatedSample";

/// Heterozygous genotype assigned to every simulated call
pub const HET_GENOTYPE: &str = "0/1";

/// Multiplier applied to fractional COSMIC signature weights
pub const SBS_SCALE: f64 = 1.0e6;
