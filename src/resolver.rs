use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::config::{EvaluationMode, ResolverConfig};
use crate::containment::{self, Containment};
use crate::error::Result;
use crate::index::BvhIndex;
use crate::store::{FsRingSource, PolygonStore, RingLoad, RingSource};
use crate::types::{Point, PolygonRef};

/// Outcome of a successful lookup.
///
/// `NoTimezone` (open ocean, unmapped area) is an expected answer, not an
/// error; internal failures come back as `Err` from the resolver instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(String),
    NoTimezone,
}

impl Resolution {
    pub fn timezone_id(&self) -> Option<&str> {
        match self {
            Resolution::Found(id) => Some(id),
            Resolution::NoTimezone => None,
        }
    }

    pub fn into_timezone_id(self) -> Option<String> {
        match self {
            Resolution::Found(id) => Some(id),
            Resolution::NoTimezone => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// Full accounting of one lookup, every candidate evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionReport {
    pub resolution: Resolution,
    /// Refs returned by the BVH descent.
    pub candidates: usize,
    /// Candidates dropped because their ring could not be loaded.
    pub unavailable: usize,
    /// Timezone ids of every matching candidate, in descent order.
    pub matches: Vec<String>,
}

/// What happened to one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Evaluation {
    Unavailable,
    Classified(Containment),
}

impl Evaluation {
    fn is_match(self) -> bool {
        matches!(self, Evaluation::Classified(c) if c.is_match())
    }
}

/// Point to timezone lookup: BVH descent, bbox filter, lazy ring load,
/// exact containment test, first match in descent order.
pub struct TimezoneResolver<S> {
    index: Arc<BvhIndex>,
    store: PolygonStore<S>,
    evaluation: EvaluationMode,
}

impl TimezoneResolver<FsRingSource> {
    /// Load the BVH artifact and set up a ring store on the filesystem with
    /// a fresh cache. Fails if the artifact is missing or malformed.
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        info!(
            bvh = %config.bvh_path.display(),
            rings = %config.ring_dir.display(),
            evaluation = %config.evaluation,
            "Initializing timezone resolver"
        );
        let index = BvhIndex::load(&config.bvh_path, config.bvh_format)?;
        let store = PolygonStore::new(FsRingSource::new(&config.ring_dir));
        Ok(Self::new(Arc::new(index), store).with_evaluation(config.evaluation))
    }
}

impl<S: RingSource> TimezoneResolver<S> {
    pub fn new(index: Arc<BvhIndex>, store: PolygonStore<S>) -> Self {
        Self {
            index,
            store,
            evaluation: EvaluationMode::Sequential,
        }
    }

    pub fn with_evaluation(mut self, evaluation: EvaluationMode) -> Self {
        self.evaluation = evaluation;
        self
    }

    pub fn index(&self) -> &Arc<BvhIndex> {
        &self.index
    }

    pub fn store(&self) -> &PolygonStore<S> {
        &self.store
    }

    pub fn evaluation(&self) -> EvaluationMode {
        self.evaluation
    }

    /// Resolve `point` to the id of the timezone whose ring contains it.
    ///
    /// When several rings contain the point (seams, overlaps) the first one
    /// found during BVH descent wins, in both evaluation modes.
    pub fn resolve(&self, point: Point) -> Result<Resolution> {
        let candidates = self.index.candidates(point)?;
        debug!(
            lon = point.lon,
            lat = point.lat,
            candidates = candidates.len(),
            "Candidates gathered"
        );

        let winner = match self.evaluation {
            EvaluationMode::Sequential => candidates
                .iter()
                .find(|c| self.evaluate(c, point).is_match()),
            EvaluationMode::Parallel => {
                let evaluations = self.evaluate_all(&candidates, point);
                candidates
                    .iter()
                    .zip(&evaluations)
                    .find_map(|(c, e)| e.is_match().then_some(c))
            }
        };

        let resolution = match winner {
            Some(c) => Resolution::Found(c.timezone_id.clone()),
            None => Resolution::NoTimezone,
        };
        debug!(lon = point.lon, lat = point.lat, resolution = ?resolution, "Resolved");
        Ok(resolution)
    }

    /// Like [`resolve`](Self::resolve) but evaluates every candidate and
    /// reports all matches, which helps when diagnosing boundary seams.
    pub fn resolve_report(&self, point: Point) -> Result<ResolutionReport> {
        let candidates = self.index.candidates(point)?;
        let evaluations = self.evaluate_all(&candidates, point);

        let unavailable = evaluations
            .iter()
            .filter(|e| matches!(e, Evaluation::Unavailable))
            .count();
        let matches: Vec<String> = candidates
            .iter()
            .zip(&evaluations)
            .filter(|(_, e)| e.is_match())
            .map(|(c, _)| c.timezone_id.clone())
            .collect();

        let resolution = match matches.first() {
            Some(id) => Resolution::Found(id.clone()),
            None => Resolution::NoTimezone,
        };

        Ok(ResolutionReport {
            resolution,
            candidates: candidates.len(),
            unavailable,
            matches,
        })
    }

    /// Evaluate candidates in descent order. In parallel mode the work runs
    /// on the rayon pool and `collect` keeps the input order.
    fn evaluate_all(&self, candidates: &[&PolygonRef], point: Point) -> Vec<Evaluation> {
        match self.evaluation {
            EvaluationMode::Sequential => candidates
                .iter()
                .map(|c| self.evaluate(c, point))
                .collect(),
            EvaluationMode::Parallel => candidates
                .par_iter()
                .map(|c| self.evaluate(c, point))
                .collect(),
        }
    }

    fn evaluate(&self, candidate: &PolygonRef, point: Point) -> Evaluation {
        let ring = match self.store.load(&candidate.key()) {
            RingLoad::Loaded(ring) => ring,
            RingLoad::Unavailable => return Evaluation::Unavailable,
        };
        let containment = containment::classify(&ring, point);
        trace!(
            timezone = %candidate.timezone_id,
            ring = candidate.ring_index,
            containment = ?containment,
            "Candidate classified"
        );
        Evaluation::Classified(containment)
    }
}
