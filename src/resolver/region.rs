//! Exon / intron / intergenic classification of a position inside a gene.

use crate::resolver::FeatureIndex;
use crate::types::{Gene, GeneRegion};

/// Classify `pos` against the transcripts of `gene`.
///
/// The first transcript (by id) containing the position decides: exon when
/// one of its exons contains it, intron otherwise. No containing transcript
/// means intergenic.
pub fn classify_region<I>(index: &I, gene: &Gene, pos: i64) -> Result<GeneRegion, I::Error>
where
    I: FeatureIndex + ?Sized,
{
    let transcripts = index.transcripts_of(gene)?;

    let Some(transcript) = transcripts.iter().find(|t| t.contains(pos)) else {
        return Ok(GeneRegion::Intergenic);
    };

    match index.exon_number_at(&transcript.transcript_id, pos)? {
        Some(number) => Ok(GeneRegion::Exon(number)),
        None => Ok(GeneRegion::Intron),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::memory::MemoryIndex;

    fn index() -> MemoryIndex {
        let mut index = MemoryIndex::default();
        index.add_gene("G1", 1000, 5000);
        index.add_transcript("T2", "G1", &[(1000, 1100), (1500, 1600), (2000, 2100)]);
        index.add_transcript("T1", "G1", &[(1050, 1080), (3000, 3200)]);
        index
    }

    fn classify(index: &MemoryIndex, pos: i64) -> GeneRegion {
        let gene = index.genes[0].clone();
        classify_region(index, &gene, pos).unwrap()
    }

    #[test]
    fn test_exon_and_intron() {
        let index = index();
        // T1 (1050-3200) is checked before T2
        assert_eq!(classify(&index, 1060), GeneRegion::Exon(1));
        assert_eq!(classify(&index, 3100), GeneRegion::Exon(2));
        assert_eq!(classify(&index, 1550), GeneRegion::Intron);
    }

    #[test]
    fn test_falls_through_to_second_transcript() {
        let index = index();
        assert_eq!(classify(&index, 1010), GeneRegion::Exon(1));
    }

    #[test]
    fn test_intergenic() {
        let index = index();
        // Inside the gene, outside every transcript
        assert_eq!(classify(&index, 4500), GeneRegion::Intergenic);

        let mut bare = MemoryIndex::default();
        bare.add_gene("G9", 1, 100);
        assert_eq!(classify(&bare, 50), GeneRegion::Intergenic);
    }
}
