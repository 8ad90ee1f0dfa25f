//! Partitioning of extracted lines into bounded chunks.

use super::TextError;

/// Default maximum number of lines per chunk.
pub const DEFAULT_CHUNK_BOUND: usize = 99;

/// A line of article text with its position in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    /// 1-based position across the whole document
    pub index: usize,
    /// The cleaned text content
    pub text: String,
}

/// An ordered group of at most `bound` consecutive lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    lines: Vec<Line>,
}

impl Chunk {
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }
}

/// Split lines into consecutive chunks of at most `bound` lines.
///
/// Order is preserved and nothing is dropped: concatenating the chunks gives
/// back the input. Lines are numbered 1..=n across all chunks.
pub fn chunk(lines: Vec<String>, bound: usize) -> Result<Vec<Chunk>, TextError> {
    if bound == 0 {
        return Err(TextError::InvalidBound(bound));
    }

    let mut chunks = Vec::with_capacity(lines.len().div_ceil(bound));
    let mut current = Vec::new();

    for (i, text) in lines.into_iter().enumerate() {
        current.push(Line { index: i + 1, text });
        if current.len() == bound {
            chunks.push(Chunk {
                lines: std::mem::take(&mut current),
            });
        }
    }

    if !current.is_empty() {
        chunks.push(Chunk { lines: current });
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn lines(n: usize) -> Vec<String> {
        (1..=n).map(|i| format!("line {}", i)).collect()
    }

    fn texts(chunks: &[Chunk]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|c| c.lines())
            .map(|l| l.text.clone())
            .collect()
    }

    #[test]
    fn test_chunk_empty() {
        for bound in [1, 2, 99] {
            assert!(chunk(Vec::new(), bound).unwrap().is_empty());
        }
    }

    #[test]
    fn test_chunk_zero_bound() {
        assert!(matches!(chunk(lines(3), 0), Err(TextError::InvalidBound(0))));
    }

    #[test]
    fn test_chunk_exact_multiple() {
        let chunks = chunk(lines(6), 3).unwrap();
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.lines().len() == 3));
    }

    #[test]
    fn test_chunk_short_tail() {
        let chunks = chunk(lines(7), 3).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(|c| c.lines().len()).collect();
        assert_eq!(sizes, vec![3, 3, 1]);
    }

    #[test]
    fn test_chunk_default_bound() {
        let chunks = chunk(lines(200), DEFAULT_CHUNK_BOUND).unwrap();
        let sizes: Vec<usize> = chunks.iter().map(|c| c.lines().len()).collect();
        assert_eq!(sizes, vec![99, 99, 2]);
    }

    #[test]
    fn test_indices_are_global() {
        let chunks = chunk(lines(5), 2).unwrap();
        let indices: Vec<usize> = chunks
            .iter()
            .flat_map(|c| c.lines())
            .map(|l| l.index)
            .collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert_eq!(chunks[1].lines()[0].text, "line 3");
    }

    proptest! {
        #[test]
        fn prop_chunk_is_lossless_partition(
            input in proptest::collection::vec("[a-z ]{1,12}", 0..300),
            bound in 1usize..120,
        ) {
            let chunks = chunk(input.clone(), bound).unwrap();

            prop_assert_eq!(texts(&chunks), input.clone());
            prop_assert!(chunks.iter().all(|c| !c.lines().is_empty() && c.lines().len() <= bound));
            if let Some((last, full)) = chunks.split_last() {
                prop_assert!(full.iter().all(|c| c.lines().len() == bound));
                prop_assert!(last.lines().len() <= bound);
            }
            prop_assert_eq!(chunks.len(), input.len().div_ceil(bound));
        }
    }
}
