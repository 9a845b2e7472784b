use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::constants::*;
use crate::error::Result;
use crate::variant::{chrom_order, ChromosomeVariant};

/// Single-sample VCF 4.2 writer.
pub struct Writer<W: io::Write> {
    inner: W,
    source: String,
    sample: String,
}

impl Writer<io::BufWriter<fs::File>> {
    pub fn from_file<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        fs::File::create(path).map(|f| Writer::new(io::BufWriter::new(f)))
    }
}

impl<W: io::Write> Writer<W> {
    pub fn new(inner: W) -> Self {
        Writer { inner, source: VCF_SOURCE.to_owned(), sample: VCF_SAMPLE.to_owned() }
    }

    /// Set the tool named in the header and the sample column name.
    pub fn with_names(mut self, source: &str, sample: &str) -> Self {
        self.source = source.to_owned();
        self.sample = sample.to_owned();
        self
    }

    /// Write the header and one heterozygous call per variant, in the given order.
    ///
    /// Contigs are declared only for chromosomes that carry a variant.
    pub fn write(mut self, variants: &[ChromosomeVariant]) -> Result<()> {
        let mut contigs: Vec<&str> = variants.iter()
            .map(|v| v.chrom.as_str())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        contigs.sort_by(|a, b| chrom_order(a, b));

        writeln!(self.inner, "##fileformat=VCFv4.2")?;
        writeln!(self.inner, "##source={}", self.source)?;
        for chrom in contigs.iter() {
            writeln!(self.inner, "##contig=<ID={}>", chrom)?;
        }
        writeln!(self.inner, "##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count in genotypes\">")?;
        writeln!(self.inner, "##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">")?;
        writeln!(self.inner, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\t{}", self.sample)?;

        let mut records = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .quote_style(csv::QuoteStyle::Never)
            .terminator(csv::Terminator::Any(b'\n'))
            .has_headers(false)
            .from_writer(self.inner);
        for v in variants.iter() {
            let pos = v.pos.to_string();
            let nt_ref = (v.nt_ref as char).to_string();
            let nt_alt = (v.nt_alt as char).to_string();
            records.write_record(&[
                v.chrom.as_str(), pos.as_str(), ".", nt_ref.as_str(), nt_alt.as_str(), ".", "PASS", ".", "GT", HET_GENOTYPE,
            ])?;
        }
        records.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(chrom: &str, pos: u64, r: u8, a: u8) -> ChromosomeVariant {
        ChromosomeVariant { chrom: chrom.to_owned(), pos, nt_ref: r, nt_alt: a }
    }

    #[test]
    fn test_write() {
        let variants = vec![
            variant("Y", 2787387, b'C', b'T'),
            variant("18", 74158243, b'G', b'A'),
            variant("2", 100, b'A', b'G'),
            variant("18", 74158243, b'G', b'A'),
            variant("X", 49067337, b'G', b'A'),
        ];
        let mut out = Vec::new();
        Writer::new(&mut out).write(&variants).unwrap();
        let text = String::from_utf8(out).unwrap();

        let expected = "##fileformat=VCFv4.2
##source=mutsim
##contig=<ID=2>
##contig=<ID=18>
##contig=<ID=X>
##contig=<ID=Y>
##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count in genotypes\">
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tSimulatedSample
Y\t2787387\t.\tC\tT\t.\tPASS\t.\tGT\t0/1
18\t74158243\t.\tG\tA\t.\tPASS\t.\tGT\t0/1
2\t100\t.\tA\tG\t.\tPASS\t.\tGT\t0/1
18\t74158243\t.\tG\tA\t.\tPASS\t.\tGT\t0/1
X\t49067337\t.\tG\tA\t.\tPASS\t.\tGT\t0/1
";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_write_empty() {
        let mut out = Vec::new();
        Writer::new(&mut out).with_names("sim", "S1").write(&[]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("##source=sim\n"));
        assert!(!text.contains("##contig"));
        assert!(text.ends_with("FORMAT\tS1\n"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.vcf");
        Writer::from_file(&path).unwrap().write(&[variant("1", 5, b'A', b'C')]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("1\t5\t.\tA\tC\t.\tPASS\t.\tGT\t0/1\n"));
    }
}
