use log::debug;
use parking_lot::Mutex;
use crate::problem::generator::input_size;
use crate::problem::{Generator, GeneratorResult, InputGenerator, TestGroups};

/// Largest generated test set kept in memory
pub const MAX_CACHEABLE: usize = 128 * 1024;

/// Generator that remembers small outputs.
///
/// After the first successful run producing at most [`MAX_CACHEABLE`]
/// bytes, the wrapped generator is replaced by a list holding that output.
/// Larger outputs are regenerated on every call.
#[derive(Debug)]
pub struct CachedGenerator {
    inner: Mutex<Generator>,
}

impl CachedGenerator {
    pub fn new(generator: Generator) -> Self {
        Self {
            inner: Mutex::new(generator),
        }
    }

    /// The generator in its current state
    pub fn snapshot(&self) -> Generator {
        self.inner.lock().clone()
    }

    /// Whether the output is already memoized
    pub fn is_cached(&self) -> bool {
        self.inner.lock().is_list()
    }
}

impl Clone for CachedGenerator {
    fn clone(&self) -> Self {
        Self::new(self.snapshot())
    }
}

impl From<Generator> for CachedGenerator {
    fn from(generator: Generator) -> Self {
        Self::new(generator)
    }
}

impl InputGenerator for CachedGenerator {
    fn generate_input(&self) -> GeneratorResult<TestGroups> {
        let generator = {
            let inner = self.inner.lock();
            if let Generator::List(groups) = &*inner {
                return Ok(groups.clone());
            }
            inner.clone()
        };

        // run without holding the lock; concurrent first calls may both generate
        let groups = generator.generate_input()?;

        let size = input_size(&groups);
        if size <= MAX_CACHEABLE {
            debug!("caching {} bytes of generated tests", size);
            *self.inner.lock() = Generator::List(groups.clone());
        } else {
            debug!("generated {} bytes of tests, too large to cache", size);
        }

        Ok(groups)
    }
}
