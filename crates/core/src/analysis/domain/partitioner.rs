/// One worker's contiguous share of the frame sequence.
#[derive(Debug, PartialEq)]
pub struct Chunk<T> {
    pub worker: usize,
    /// Global index of the first item, `worker * batch_size`.
    pub offset: usize,
    pub items: Vec<T>,
}

/// Splits `items` into `workers` contiguous, order-preserving chunks.
///
/// Every worker gets `len / workers` items; the last one also takes the
/// remainder. With fewer items than workers the leading chunks are empty.
/// A worker count of zero is treated as one.
pub fn partition<T>(items: Vec<T>, workers: usize) -> Vec<Chunk<T>> {
    let workers = workers.max(1);
    let batch_size = items.len() / workers;
    let mut rest = items.into_iter();

    (0..workers)
        .map(|worker| {
            let take = if worker + 1 == workers {
                usize::MAX
            } else {
                batch_size
            };
            Chunk {
                worker,
                offset: worker * batch_size,
                items: rest.by_ref().take(take).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lengths(chunks: &[Chunk<usize>]) -> Vec<usize> {
        chunks.iter().map(|c| c.items.len()).collect()
    }

    #[rstest]
    #[case::even(10, 2, vec![5, 5])]
    #[case::remainder_goes_last(10, 3, vec![3, 3, 4])]
    #[case::fewer_items_than_workers(2, 4, vec![0, 0, 0, 2])]
    #[case::empty(0, 3, vec![0, 0, 0])]
    #[case::single_worker(7, 1, vec![7])]
    fn test_chunk_lengths(#[case] len: usize, #[case] workers: usize, #[case] expected: Vec<usize>) {
        let chunks = partition((0..len).collect(), workers);
        assert_eq!(lengths(&chunks), expected);
    }

    #[test]
    fn test_offsets_are_multiples_of_batch_size() {
        let chunks = partition((0..11).collect::<Vec<_>>(), 3);
        let offsets: Vec<usize> = chunks.iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 3, 6]);
        assert_eq!(chunks[2].items, vec![6, 7, 8, 9, 10]);
    }

    #[test]
    fn test_zero_workers_behaves_like_one() {
        let chunks = partition(vec![1, 2, 3], 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].items, vec![1, 2, 3]);
    }

    #[test]
    fn test_concatenation_and_offsets_hold_for_all_sizes() {
        for len in 0..40usize {
            for workers in 1..9usize {
                let chunks = partition((0..len).collect(), workers);
                assert_eq!(chunks.len(), workers);

                let batch = len / workers;
                for chunk in &chunks {
                    assert_eq!(chunk.offset, chunk.worker * batch);
                    if let Some(first) = chunk.items.first() {
                        assert_eq!(*first, chunk.offset);
                    }
                    if chunk.worker + 1 < workers {
                        assert_eq!(chunk.items.len(), batch);
                    }
                }
                assert_eq!(chunks[workers - 1].items.len(), batch + len - workers * batch);

                let joined: Vec<usize> = chunks.into_iter().flat_map(|c| c.items).collect();
                assert_eq!(joined, (0..len).collect::<Vec<_>>());
            }
        }
    }
}
