///
/// Split of `sampling` trials into chunks of at most `chunk_size`; the last
/// chunk carries the remainder and is never overshot.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    sampling: usize,
    chunk_size: usize,
    num_chunks: usize,
}

impl ChunkPlan {
    ///
    /// A chunk size above `sampling` is clamped to one chunk. A zero chunk
    /// size is treated as 1; `sampling == 0` yields an empty plan.
    ///
    pub fn new(sampling: usize, chunk_size: usize) -> Self {
        let chunk_size = chunk_size.clamp(1, sampling.max(1));
        let num_chunks = sampling.div_ceil(chunk_size);
        Self {
            sampling,
            chunk_size,
            num_chunks,
        }
    }

    pub fn sampling(&self) -> usize {
        self.sampling
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn num_chunks(&self) -> usize {
        self.num_chunks
    }

    pub fn chunk_len(&self, chunk: usize) -> usize {
        if chunk + 1 < self.num_chunks {
            self.chunk_size
        } else if chunk + 1 == self.num_chunks {
            self.sampling - self.chunk_size * (self.num_chunks - 1)
        } else {
            0
        }
    }

    pub fn first_trial(&self, chunk: usize) -> u64 {
        (chunk * self.chunk_size) as u64
    }

    /// `(chunk, first_trial, trials)` for every chunk.
    pub fn chunks(self) -> impl Iterator<Item = (usize, u64, usize)> {
        (0..self.num_chunks).map(move |c| (c, self.first_trial(c), self.chunk_len(c)))
    }
}

/// One unit of work for a sampling worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkTask {
    /// Element slot in the index
    pub slot: usize,
    pub chunk: usize,
    pub first_trial: u64,
    pub trials: usize,
    /// 0 for the first run, 1 for the retry
    pub attempt: u8,
}

impl ChunkTask {
    pub fn retry(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}
