//! One simulation run: sample, place, resolve, extract, write.

use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rand::Rng;

use crate::config::OutputConfig;
use crate::error::Result;
use crate::index::store::{IndexCache, IndexStore};
use crate::index::TripletCountCatalog;
use crate::io::{lists, vcf};
use crate::mutation::{CodingMutation, Event, FrequencySpectrum};
use crate::resolve::client::AnnotationService;
use crate::resolve::{GenomicResolution, GenomicResolver};
use crate::sample::{self, Fidelity};
use crate::variant::{self, ChromosomeVariant, CoordinateExtractor};

/// Genomic records obtained from coding notations.
#[derive(Debug, Default)]
pub struct Resolved {
    pub resolution: GenomicResolution,
    /// Canonical-chromosome variants, in resolution order
    pub variants: Vec<ChromosomeVariant>,
    /// Resolved notations that did not yield a canonical variant
    pub dropped: usize,
}

/// Resolve coding notations and extract canonical chromosome variants.
pub fn resolve_descriptors<A>(descriptors: &[String], resolver: &GenomicResolver<A>, extractor: &CoordinateExtractor) -> Resolved
where
    A: AnnotationService + ?Sized,
{
    let resolution = resolver.resolve(descriptors);
    let extracted = extractor.extract_all(resolution.genomic());
    let variants = variant::canonical(extracted);
    let dropped = resolution.resolved.len() - variants.len();
    info!("{} variants; {} failed to resolve, {} dropped", variants.len(), resolution.failed.len(), dropped);
    Resolved { resolution, variants, dropped }
}

#[derive(Debug)]
pub struct RunOutput {
    pub mutations: Vec<CodingMutation>,
    /// Sampled events whose triplet no transcript contains
    pub skipped: Vec<Event>,
    pub fidelity: Fidelity,
    pub resolved: Resolved,
}

/// Everything a run reads, shared across the runs of an invocation.
pub struct Simulator<'a, S: IndexStore + ?Sized, A: AnnotationService + ?Sized> {
    pub catalog: &'a TripletCountCatalog,
    pub indexes: IndexCache<'a, S>,
    pub resolver: GenomicResolver<'a, A>,
    pub extractor: CoordinateExtractor,
    pub tolerance: f64,
}

impl<'a, S: IndexStore + ?Sized, A: AnnotationService + ?Sized> Simulator<'a, S, A> {
    pub fn run<R: Rng + ?Sized>(&mut self, spectrum: &FrequencySpectrum, n: usize, rng: &mut R) -> Result<RunOutput> {
        let events = sample::sample_events(spectrum, n, self.tolerance, rng)?;
        let fidelity = sample::fidelity(spectrum, &events);
        info!("sampled {} events (JS divergence {:.3e}, cosine similarity {:.4})",
            events.len(), fidelity.js_divergence, fidelity.cosine_similarity);

        let sim = sample::simulate(&events, self.catalog, &mut self.indexes, rng)?;
        if !sim.skipped.is_empty() {
            warn!("{} events skipped: triplet absent from all transcripts", sim.skipped.len());
        }

        let descriptors: Vec<String> = sim.mutations.iter().map(|x| x.to_string()).collect();
        let resolved = resolve_descriptors(&descriptors, &self.resolver, &self.extractor);

        Ok(RunOutput { mutations: sim.mutations, skipped: sim.skipped, fidelity, resolved })
    }
}

/// Output name of run k (1-based) of r: `<name>_<signature>_<k>_of_<r>`.
pub fn run_name(name: &str, signature: &str, k: usize, r: usize) -> String {
    format!("{}_{}_{}_of_{}", name, signature, k, r)
}

/// Stem of a file name, without directory and extension.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|x| x.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Write the VCF and the failure table of a resolution at `<stem>.vcf` and
/// `<stem>.failed.tsv`.
pub fn write_resolved(stem: &Path, resolved: &Resolved, output: &OutputConfig) -> Result<(PathBuf, PathBuf)> {
    let vcf_path = with_suffix(stem, ".vcf");
    vcf::Writer::from_file(&vcf_path)?
        .with_names(&output.source, &output.sample)
        .write(&resolved.variants)?;

    let failed_path = with_suffix(stem, ".failed.tsv");
    let mut w = lists::create(&failed_path)?;
    writeln!(w, "input\treason\tdetail")?;
    lists::write_lines(&mut w, resolved.resolution.failed.iter().map(|(x, r)| format!("{}\t{}", x, r)))?;

    Ok((vcf_path, failed_path))
}

/// Write the coding notations of a run at `<stem>.txt`, then its resolution.
pub fn write_run(stem: &Path, out: &RunOutput, output: &OutputConfig) -> Result<()> {
    let txt_path = with_suffix(stem, ".txt");
    lists::write_lines(lists::create(&txt_path)?, out.mutations.iter())?;
    let (vcf_path, _) = write_resolved(stem, &out.resolved, output)?;
    info!("wrote {} and {}", txt_path.display(), vcf_path.display());
    Ok(())
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut x = stem.as_os_str().to_owned();
    x.push(suffix);
    PathBuf::from(x)
}
