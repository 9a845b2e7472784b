pub mod fasta;
pub mod lists;
pub mod profile;
pub mod vcf;
