use tracing::{debug, info, warn};

use crate::container::Container;
use crate::payload::CachedPayload;
use crate::tree::{NodeId, NodeKind, StructuralError, Tree};
use crate::write_back::{DataProducer, DirtyObserver, FlushPolicy};

/// Counters collected while flushing a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Nodes the traversal passed through.
    pub visited: usize,
    /// Dirty nodes whose bytes were replaced.
    pub written: usize,
    /// Dirty nodes whose producer gave nothing to write.
    pub abstained: usize,
}

impl Tree {
    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: FlushPolicy) {
        self.policy = policy;
    }

    /// Installs the producer used when `id` is flushed while dirty.
    ///
    /// Without a producer the node's cached payload is encoded instead.
    pub fn set_producer(
        &mut self,
        id: NodeId,
        producer: impl DataProducer + 'static,
    ) -> Result<(), StructuralError> {
        self.live_mut(id)?.producer = Some(Box::new(producer));
        Ok(())
    }

    pub fn clear_producer(&mut self, id: NodeId) -> Result<(), StructuralError> {
        self.live_mut(id)?.producer = None;
        Ok(())
    }

    /// Installs the dirty-flag observer of a single node.
    pub fn set_observer(
        &mut self,
        id: NodeId,
        observer: impl DirtyObserver + 'static,
    ) -> Result<(), StructuralError> {
        self.live_mut(id)?.observer = Some(Box::new(observer));
        Ok(())
    }

    /// Observer notified for nodes that have no observer of their own.
    pub fn set_default_observer(&mut self, observer: impl DirtyObserver + 'static) {
        self.default_observer = Some(Box::new(observer));
    }

    pub fn is_dirty(&self, id: NodeId) -> Result<bool, StructuralError> {
        Ok(self.live(id)?.dirty)
    }

    pub fn mark_dirty(&mut self, id: NodeId) -> Result<(), StructuralError> {
        self.set_dirty(id, true).map(|_| ())
    }

    /// Sets the dirty flag and returns whether it actually changed.
    ///
    /// A change is reported to the node's observer, or the default observer,
    /// before the flag is stored.
    pub fn set_dirty(&mut self, id: NodeId, dirty: bool) -> Result<bool, StructuralError> {
        let (node, default_observer) = self.node_and_default_observer(id)?;
        if node.dirty == dirty {
            return Ok(false);
        }

        match node.observer.as_mut() {
            Some(observer) => observer.dirty_changed(id, &node.key, dirty),
            None => {
                if let Some(observer) = default_observer {
                    observer.dirty_changed(id, &node.key, dirty);
                }
            }
        }
        node.dirty = dirty;
        Ok(true)
    }

    /// All live nodes currently marked dirty.
    pub fn dirty_nodes(&self) -> Vec<NodeId> {
        self.live_ids()
            .filter(|&id| self.node(id).is_some_and(|node| node.dirty))
            .collect()
    }

    /// Writes dirty payloads back to bytes, depth first, and returns the
    /// freshly built container of the subtree rooted at `id`.
    pub fn flush<C: Container>(&mut self, id: NodeId) -> Result<C, StructuralError> {
        self.flush_with_report(id).map(|(container, _)| container)
    }

    pub fn flush_with_report<C: Container>(
        &mut self,
        id: NodeId,
    ) -> Result<(C, FlushReport), StructuralError> {
        let mut report = FlushReport::default();
        let container = self.flush_node(id, &mut report)?;
        info!(
            "Flushed '{}': {} nodes visited, {} written, {} abstained",
            self.key(id)?,
            report.visited,
            report.written,
            report.abstained
        );
        Ok((container, report))
    }

    /// Builds the container of a subtree without running any producer.
    pub fn snapshot<C: Container>(&self, id: NodeId) -> Result<C, StructuralError> {
        let node = self.live(id)?;
        match &node.kind {
            NodeKind::File(contents) => Ok(C::file(contents.clone())),
            NodeKind::Directory(children) => {
                let mut composite = C::directory();
                for (key, &child) in children.iter() {
                    let container = self.snapshot(child)?;
                    link_entry(&mut composite, key.clone(), container);
                }
                Ok(composite)
            }
        }
    }

    fn flush_node<C: Container>(
        &mut self,
        id: NodeId,
        report: &mut FlushReport,
    ) -> Result<C, StructuralError> {
        report.visited += 1;
        if let Some(produced) = self.produce(id)? {
            let node = self.live(id)?;
            let bytes = match produced {
                Some(_) if node.is_directory() => {
                    warn!("Ignoring bytes produced for directory '{}'", node.key);
                    None
                }
                other => other,
            };
            self.write_back(id, bytes, report)?;
        }

        let children = match &self.live(id)?.kind {
            NodeKind::File(contents) => return Ok(C::file(contents.clone())),
            NodeKind::Directory(children) => children
                .iter()
                .map(|(key, &child)| (key.clone(), child))
                .collect::<Vec<_>>(),
        };
        let mut composite = C::directory();
        for (key, child) in children {
            let container = self.flush_node(child, report)?;
            link_entry(&mut composite, key, container);
        }
        Ok(composite)
    }

    /// Runs the producer of a dirty node; `None` when the node is clean.
    fn produce(&mut self, id: NodeId) -> Result<Option<Option<Vec<u8>>>, StructuralError> {
        let node = self.live_mut(id)?;
        if !node.dirty {
            return Ok(None);
        }
        let bytes = match node.producer.as_mut() {
            Some(producer) => producer.produce(id, &node.key),
            None => node
                .payload
                .get()
                .and_then(Option::as_ref)
                .and_then(CachedPayload::encode),
        };
        Ok(Some(bytes))
    }

    fn write_back(
        &mut self,
        id: NodeId,
        bytes: Option<Vec<u8>>,
        report: &mut FlushReport,
    ) -> Result<(), StructuralError> {
        match bytes {
            Some(bytes) => {
                self.set_dirty(id, false)?;
                let node = self.live_mut(id)?;
                debug!("Writing {} bytes back to '{}'", bytes.len(), node.key);
                if let NodeKind::File(contents) = &mut node.kind {
                    *contents = bytes;
                }
                report.written += 1;
            }
            None => {
                report.abstained += 1;
                match self.policy {
                    FlushPolicy::Lenient => {
                        debug!("Nothing produced for '{}', clearing dirty flag", self.key(id)?);
                        self.set_dirty(id, false)?;
                    }
                    FlushPolicy::Strict => {
                        debug!("Nothing produced for '{}', keeping it dirty", self.key(id)?);
                    }
                }
            }
        }
        Ok(())
    }
}

fn link_entry<C: Container>(composite: &mut C, key: String, container: C) {
    if composite.insert_entry(key, container).is_err() {
        warn!("Container refused a child entry of a directory node");
    }
}
