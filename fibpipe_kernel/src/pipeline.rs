//! Fibpipe Kernel: Transformation Pipelines
//!
//! Composition is strictly left to right: the output of stage `i` is the
//! input of stage `i + 1`. A built pipeline never changes and can be
//! cloned or shared across threads; clones share one stage list.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

/// `then(f, g)(x) == g(f(x))`.
pub fn then<A, B, C, F, G>(f: F, g: G) -> impl Fn(A) -> C
where
    F: Fn(A) -> B,
    G: Fn(B) -> C,
{
    move |x| g(f(x))
}

/// Compose any number of functions left to right, with types checked at
/// each link. `compose!()` is the identity.
///
/// ```
/// use fibpipe_kernel::compose;
///
/// let process = compose!(|x: i64| x + 1, |x: i64| x * 2, |x: i64| x * 3);
/// assert_eq!(process(3), 24);
/// ```
#[macro_export]
macro_rules! compose {
    () => {
        |x| x
    };
    ($f:expr $(,)?) => {
        $f
    };
    ($f:expr, $($rest:expr),+ $(,)?) => {
        $crate::pipeline::then($f, $crate::compose!($($rest),+))
    };
}

pub type Stage<T> = Box<dyn Fn(T) -> T + Send + Sync>;

/// Box a closure as a [`Stage`].
pub fn stage<T, F>(f: F) -> Stage<T>
where
    F: Fn(T) -> T + Send + Sync + 'static,
{
    Box::new(f)
}

/// An ordered list of unary functions applied as one.
pub struct Pipeline<T> {
    stages: Arc<Vec<Stage<T>>>,
}

impl<T> Pipeline<T> {
    pub fn compose(stages: Vec<Stage<T>>) -> Self {
        Self {
            stages: Arc::new(stages),
        }
    }

    /// A pipeline with no stages; returns its input unchanged.
    pub fn identity() -> Self {
        Self::compose(Vec::new())
    }

    pub fn builder() -> PipelineBuilder<T> {
        PipelineBuilder { stages: Vec::new() }
    }

    pub fn apply(&self, input: T) -> T {
        self.stages.iter().fold(input, |value, stage| stage(value))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn into_fn(self) -> impl Fn(T) -> T {
        move |x| self.apply(x)
    }
}

/// Shorthand for [`Pipeline::compose`].
pub fn compose<T>(stages: Vec<Stage<T>>) -> Pipeline<T> {
    Pipeline::compose(stages)
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            stages: Arc::clone(&self.stages),
        }
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

pub struct PipelineBuilder<T> {
    stages: Vec<Stage<T>>,
}

impl<T> PipelineBuilder<T> {
    pub fn stage<F>(mut self, f: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.stages.push(Box::new(f));
        self
    }

    pub fn build(self) -> Pipeline<T> {
        Pipeline::compose(self.stages)
    }
}

pub type TryStage<T, E> = Box<dyn Fn(T) -> Result<T, E> + Send + Sync>;

/// A failing stage, identified by position and name.
#[derive(Debug, Error)]
#[error("stage {index} ({name}) failed: {source}")]
pub struct StageError<E> {
    pub index: usize,
    pub name: String,
    #[source]
    pub source: E,
}

struct NamedStage<T, E> {
    name: String,
    run: TryStage<T, E>,
}

/// Pipeline of fallible stages.
///
/// The first failure is returned as-is; stages after it are not invoked.
pub struct TryPipeline<T, E> {
    stages: Arc<Vec<NamedStage<T, E>>>,
}

impl<T, E> TryPipeline<T, E> {
    pub fn identity() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TryPipelineBuilder<T, E> {
        TryPipelineBuilder { stages: Vec::new() }
    }

    pub fn apply(&self, input: T) -> Result<T, StageError<E>> {
        let mut value = input;
        for (index, stage) in self.stages.iter().enumerate() {
            value = (stage.run)(value).map_err(|source| {
                trace!(index, stage = %stage.name, "stage failed");
                StageError {
                    index,
                    name: stage.name.clone(),
                    source,
                }
            })?;
        }
        Ok(value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl<T, E> Clone for TryPipeline<T, E> {
    fn clone(&self) -> Self {
        Self {
            stages: Arc::clone(&self.stages),
        }
    }
}

impl<T, E> fmt::Debug for TryPipeline<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub struct TryPipelineBuilder<T, E> {
    stages: Vec<NamedStage<T, E>>,
}

impl<T, E> TryPipelineBuilder<T, E> {
    pub fn stage<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(T) -> Result<T, E> + Send + Sync + 'static,
    {
        self.boxed(name, Box::new(f))
    }

    pub fn boxed(mut self, name: impl Into<String>, run: TryStage<T, E>) -> Self {
        self.stages.push(NamedStage {
            name: name.into(),
            run,
        });
        self
    }

    pub fn build(self) -> TryPipeline<T, E> {
        TryPipeline {
            stages: Arc::new(self.stages),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use thiserror::Error;

    use super::*;

    fn increment(x: i64) -> i64 {
        x + 1
    }

    fn double(x: i64) -> i64 {
        x * 2
    }

    fn triple(x: i64) -> i64 {
        x * 3
    }

    #[test]
    fn test_compose_three_stages() {
        let process = compose(vec![stage(increment), stage(double), stage(triple)]);
        assert_eq!(process.apply(3), 24);
        assert_eq!(process.len(), 3);
    }

    #[test]
    fn test_compose_macro_three_stages() {
        let process = compose!(increment, double, triple);
        assert_eq!(process(3), 24);
    }

    #[test]
    fn test_empty_is_identity() {
        let id: Pipeline<i64> = Pipeline::identity();
        assert!(id.is_empty());
        for x in [-3, 0, 5, i64::MAX] {
            assert_eq!(id.apply(x), x);
        }
        let id_macro = compose!();
        assert_eq!(id_macro(5), 5);
    }

    #[test]
    fn test_order_is_left_to_right() {
        for x in -10..10 {
            let fg = compose(vec![stage(increment), stage(double)]);
            assert_eq!(fg.apply(x), double(increment(x)));
            let gf = compose(vec![stage(double), stage(increment)]);
            assert_eq!(gf.apply(x), increment(double(x)));
            assert_eq!(then(increment, double)(x), double(increment(x)));
        }
    }

    #[test]
    fn test_heterogeneous_macro() {
        let describe = compose!(|x: u32| x * 2, |x: u32| x.to_string(), |s: String| s.len());
        assert_eq!(describe(500), 4);
    }

    #[test]
    fn test_deterministic_reuse() {
        let process = Pipeline::builder()
            .stage(increment)
            .stage(|x: i64| x * x)
            .build();
        assert_eq!(process.apply(7), process.apply(7));
        let f = process.clone().into_fn();
        assert_eq!(f(7), 64);
        assert_eq!(process.apply(7), 64);
    }

    #[test]
    fn test_shared_across_threads() {
        let process = compose(vec![stage(increment), stage(double), stage(triple)]);
        thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let p = process.clone();
                    scope.spawn(move || (0..100).map(|x| p.apply(x + t)).sum::<i64>())
                })
                .collect();
            let sums: Vec<i64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
            for (t, sum) in sums.into_iter().enumerate() {
                let expected: i64 = (0..100).map(|x| (x + t as i64 + 1) * 6).sum();
                assert_eq!(sum, expected);
            }
        });
    }

    #[derive(Debug, PartialEq, Eq, Error)]
    #[error("odd input {0}")]
    struct Odd(i64);

    #[test]
    fn test_try_pipeline_stops_at_first_failure() {
        let after = Arc::new(AtomicUsize::new(0));
        let counter = after.clone();
        let pipeline = TryPipeline::<i64, Odd>::builder()
            .stage("increment", |x: i64| Ok(x + 1))
            .stage("halve", |x: i64| if x % 2 == 0 { Ok(x / 2) } else { Err(Odd(x)) })
            .stage("count", move |x: i64| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(x)
            })
            .build();

        assert_eq!(pipeline.apply(3).unwrap(), 2);
        assert_eq!(after.load(Ordering::SeqCst), 1);

        let err = pipeline.apply(4).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.name, "halve");
        assert_eq!(err.source, Odd(5));
        assert_eq!(err.to_string(), "stage 1 (halve) failed: odd input 5");
        assert_eq!(after.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_try_pipeline_identity_and_names() {
        let id: TryPipeline<i64, Odd> = TryPipeline::identity();
        assert_eq!(id.apply(9).unwrap(), 9);
        let named = TryPipeline::<i64, Odd>::builder()
            .stage("a", Ok)
            .stage("b", Ok)
            .build();
        assert_eq!(named.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(format!("{:?}", named), r#"["a", "b"]"#);
    }
}
