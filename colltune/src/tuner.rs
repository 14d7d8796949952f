use crate::config::TunerConfig;
use crate::decision::{CollChoice, CollRequest, SmallAllReducePolicy};
use crate::error::Result;
use crate::log::SharedSink;
use crate::plugin_log;
use crate::pool::{ContextHandle, ContextPool};
use crate::types::{CollType, LogLevel, Subsys};

/// Context pool plus selection policy: the three host entry points.
///
/// ```
/// use colltune::{CollChoice, CollRequest, CollType, Tuner, TunerConfig};
///
/// let tuner = Tuner::new(TunerConfig::default()).unwrap();
/// let ctx = tuner.init(128, 16, None).unwrap();
///
/// let mut choice = CollChoice::default();
/// tuner
///     .get_coll_info(ctx, &CollRequest::new(CollType::AllReduce, 64), &mut choice)
///     .unwrap();
/// assert_eq!(choice.algorithm, colltune::Algorithm::Tree.as_raw());
///
/// tuner.destroy(ctx).unwrap();
/// ```
pub struct Tuner {
    pool: ContextPool,
    policy: SmallAllReducePolicy,
}

impl Tuner {
    pub fn new(cfg: TunerConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            pool: ContextPool::new(cfg.max_contexts)?,
            policy: SmallAllReducePolicy::from_config(&cfg),
        })
    }

    pub fn pool(&self) -> &ContextPool {
        &self.pool
    }

    pub fn policy(&self) -> &SmallAllReducePolicy {
        &self.policy
    }

    /// Allocate a context for a new communicator.
    pub fn init(
        &self,
        n_ranks: usize,
        n_nodes: usize,
        sink: Option<SharedSink>,
    ) -> Result<ContextHandle> {
        let handle = match self.pool.allocate(n_ranks, n_nodes, sink.clone()) {
            Ok(h) => h,
            Err(e) => {
                plugin_log!(sink.as_deref(), LogLevel::Info, Subsys::COLL, "{e}.");
                return Err(e);
            }
        };

        plugin_log!(sink.as_deref(), LogLevel::Info, Subsys::INIT, "Initialized.");
        plugin_log!(
            sink.as_deref(),
            LogLevel::Info,
            Subsys::INIT,
            "nRanks: {n_ranks}, nNodes: {n_nodes}, context {handle}"
        );
        Ok(handle)
    }

    /// Possibly override the host's algorithm/protocol for one collective.
    ///
    /// `choice.n_channels` is read for logging only.
    pub fn get_coll_info(
        &self,
        handle: ContextHandle,
        req: &CollRequest,
        choice: &mut CollChoice,
    ) -> Result<()> {
        let ctx = self.pool.lookup(handle)?;
        let sink = ctx.sink();

        let Some(sel) = self.policy.decide(&ctx, req) else {
            let name = req.coll().map_or("unknown", CollType::name);
            plugin_log!(
                sink,
                LogLevel::Info,
                Subsys::COLL,
                "Collective type {} ({name}). Standard algorithm.",
                req.coll_type
            );
            return Ok(());
        };

        plugin_log!(
            sink,
            LogLevel::Info,
            Subsys::COLL,
            "AllReduce detected (nBytes: {}). Forcing {} algorithm.",
            req.n_bytes,
            sel.algorithm
        );
        choice.apply(sel);
        plugin_log!(
            sink,
            LogLevel::Info,
            Subsys::COLL,
            "Selected {} protocol.",
            sel.protocol
        );
        plugin_log!(
            sink,
            LogLevel::Info,
            Subsys::COLL,
            "Algorithm: {}, Protocol: {}, nChannels: {}",
            sel.algorithm,
            sel.protocol,
            choice.n_channels
        );
        tracing::trace!(
            slot = handle.index(),
            coll = req.coll_type,
            n_bytes = req.n_bytes,
            n_nodes = ctx.n_nodes,
            "tuner override applied"
        );
        Ok(())
    }

    /// Release a communicator's context.
    pub fn destroy(&self, handle: ContextHandle) -> Result<()> {
        let previous = self.pool.release(handle)?;
        plugin_log!(
            previous.sink(),
            LogLevel::Info,
            Subsys::COLL,
            "Destroyed."
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TunerError;
    use crate::log::RecordingSink;
    use crate::types::{Algorithm, Protocol};

    fn small_tuner() -> Tuner {
        Tuner::new(TunerConfig::default().with_max_contexts(4)).unwrap()
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(Tuner::new(TunerConfig::default().with_max_contexts(0)).is_err());
    }

    #[test]
    fn test_init_logs_two_lines() {
        let tuner = small_tuner();
        let sink = RecordingSink::new();
        let h = tuner.init(32, 4, Some(sink.clone())).unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert!(records[0].msg.ends_with("Initialized."));
        assert_eq!(records[0].subsys, Subsys::INIT);
        assert!(records[1].msg.contains("nRanks: 32, nNodes: 4"));
        assert!(records[1].msg.contains(&h.to_string()));
        assert!(records.iter().all(|r| r.level == LogLevel::Info));
    }

    #[test]
    fn test_init_zero_ranks_logs_and_fails() {
        let tuner = small_tuner();
        let sink = RecordingSink::new();
        let err = tuner.init(0, 4, Some(sink.clone())).unwrap_err();
        assert!(matches!(err, TunerError::ZeroRanks));
        let msgs = sink.messages();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("no ranks specified"));
        assert_eq!(tuner.pool().in_use().unwrap(), 0);
    }

    #[test]
    fn test_init_exhausted_logs_and_fails() {
        let tuner = Tuner::new(TunerConfig::default().with_max_contexts(1)).unwrap();
        tuner.init(1, 1, None).unwrap();
        let sink = RecordingSink::new();
        let err = tuner.init(1, 1, Some(sink.clone())).unwrap_err();
        assert!(matches!(err, TunerError::PoolExhausted { capacity: 1 }));
        assert!(sink.messages()[0].contains("ran out of context objects"));
    }

    #[test]
    fn test_forced_branch_logs_protocol() {
        let tuner = small_tuner();
        let sink = RecordingSink::new();
        let h = tuner.init(128, 16, Some(sink.clone())).unwrap();
        sink.clear();

        let mut choice = CollChoice {
            algorithm: Algorithm::Ring.as_raw(),
            protocol: Protocol::Simple.as_raw(),
            n_channels: 8,
        };
        tuner
            .get_coll_info(h, &CollRequest::new(CollType::AllReduce, 16), &mut choice)
            .unwrap();

        assert_eq!(choice.algorithm, Algorithm::Tree.as_raw());
        assert_eq!(choice.protocol, Protocol::LL.as_raw());
        assert_eq!(choice.n_channels, 8);

        let msgs = sink.messages();
        assert_eq!(msgs.len(), 3);
        assert!(msgs[0].contains("nBytes: 16"));
        assert!(msgs[0].contains("Forcing Tree algorithm"));
        assert!(msgs[1].contains("Selected LL protocol"));
        assert!(msgs[2].contains("Algorithm: Tree, Protocol: LL, nChannels: 8"));
    }

    #[test]
    fn test_standard_branch_leaves_choice() {
        let tuner = small_tuner();
        let sink = RecordingSink::new();
        let h = tuner.init(128, 16, Some(sink.clone())).unwrap();
        sink.clear();

        let before = CollChoice {
            algorithm: Algorithm::Ring.as_raw(),
            protocol: Protocol::Simple.as_raw(),
            n_channels: 4,
        };
        let mut choice = before;
        tuner
            .get_coll_info(h, &CollRequest::new(CollType::AllGather, 16), &mut choice)
            .unwrap();
        assert_eq!(choice, before);

        let msgs = sink.messages();
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].contains("Collective type 2 (AllGather). Standard algorithm."));
    }

    #[test]
    fn test_destroy_logs_through_captured_sink() {
        let tuner = small_tuner();
        let sink = RecordingSink::new();
        let h = tuner.init(8, 1, Some(sink.clone())).unwrap();
        sink.clear();

        tuner.destroy(h).unwrap();
        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert!(records[0].msg.ends_with("Destroyed."));
        assert_eq!(records[0].subsys, Subsys::COLL);
        assert_eq!(tuner.pool().in_use().unwrap(), 0);
    }

    #[test]
    fn test_calls_after_destroy_rejected() {
        let tuner = small_tuner();
        let h = tuner.init(8, 16, None).unwrap();
        tuner.destroy(h).unwrap();

        let mut choice = CollChoice::default();
        let err = tuner
            .get_coll_info(h, &CollRequest::new(CollType::AllReduce, 8), &mut choice)
            .unwrap_err();
        assert!(matches!(err, TunerError::InvalidHandle { .. }));
        assert_eq!(choice, CollChoice::default());
        assert!(tuner.destroy(h).is_err());
    }
}
