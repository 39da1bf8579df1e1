use std::any::Any;

use tracing::debug;

use crate::payload::Payload;
use crate::tree::{NodeId, NodeKind, StructuralError, Tree};

/// Type-erased cached payload. The concrete type is recovered by downcast.
pub(crate) struct CachedPayload(Box<dyn ErasedPayload>);

trait ErasedPayload {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn encode(&self) -> Option<Vec<u8>>;
}

impl<T: Payload> ErasedPayload for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn encode(&self) -> Option<Vec<u8>> {
        Payload::encode(self)
    }
}

impl CachedPayload {
    fn new<T: Payload>(value: T) -> Self {
        CachedPayload(Box::new(value))
    }

    pub(crate) fn downcast_ref<T: Payload>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub(crate) fn downcast_mut<T: Payload>(&mut self) -> Option<&mut T> {
        self.0.as_any_mut().downcast_mut::<T>()
    }

    pub(crate) fn encode(&self) -> Option<Vec<u8>> {
        self.0.encode()
    }
}

impl Tree {
    /// Returns the typed payload of a file node, decoding it on first use.
    ///
    /// Exactly one decode is attempted per node. Its outcome is cached for
    /// the node's lifetime: later calls return the cached value when it has
    /// type `T` and `None` otherwise, even if the bytes changed since.
    /// Directories, stale handles and undecodable bytes all yield `None`.
    pub fn payload<T: Payload>(&self, id: NodeId) -> Option<&T> {
        let node = self.node(id)?;
        let NodeKind::File(contents) = &node.kind else {
            return None;
        };
        let cached = node.payload.get_or_init(|| {
            debug!(
                "Decoding payload of '{}' as {}",
                node.key,
                std::any::type_name::<T>()
            );
            T::decode(contents).map(CachedPayload::new)
        });
        cached.as_ref()?.downcast_ref::<T>()
    }

    /// Whether the node's single decode attempt has happened.
    pub fn is_read(&self, id: NodeId) -> Result<bool, StructuralError> {
        Ok(self.live(id)?.payload.get().is_some())
    }

    /// Mutates the cached payload in place and marks the node dirty.
    ///
    /// Returns `Ok(None)` without touching the dirty flag when no payload of
    /// type `T` is available.
    pub fn update_payload<T, R>(
        &mut self,
        id: NodeId,
        update: impl FnOnce(&mut T) -> R,
    ) -> Result<Option<R>, StructuralError>
    where
        T: Payload,
    {
        if self.payload::<T>(id).is_none() {
            self.live(id)?;
            return Ok(None);
        }

        let result = self
            .live_mut(id)?
            .payload
            .get_mut()
            .and_then(Option::as_mut)
            .and_then(CachedPayload::downcast_mut::<T>)
            .map(update);
        if result.is_some() {
            self.mark_dirty(id)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordered_float::OrderedFloat;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Control points of an easing curve, one `f64` pair per line.
    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Easing(Vec<(OrderedFloat<f64>, OrderedFloat<f64>)>);

    impl Payload for Easing {
        fn decode(bytes: &[u8]) -> Option<Self> {
            let text = std::str::from_utf8(bytes).ok()?;
            text.lines()
                .map(|line| {
                    let (x, y) = line.split_once(' ')?;
                    Some((
                        OrderedFloat(x.parse().ok()?),
                        OrderedFloat(y.parse().ok()?),
                    ))
                })
                .collect::<Option<Vec<_>>>()
                .map(Easing)
        }

        fn encode(&self) -> Option<Vec<u8>> {
            let lines: Vec<String> = self.0.iter().map(|(x, y)| format!("{x} {y}")).collect();
            Some(lines.join("\n").into_bytes())
        }
    }

    static SOUND_DECODES: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct Sound(Vec<u8>);

    impl Payload for Sound {
        fn decode(bytes: &[u8]) -> Option<Self> {
            SOUND_DECODES.fetch_add(1, Ordering::SeqCst);
            Some(Sound(bytes.to_vec()))
        }
    }

    static BROKEN_DECODES: AtomicUsize = AtomicUsize::new(0);

    struct Broken;

    impl Payload for Broken {
        fn decode(_: &[u8]) -> Option<Self> {
            BROKEN_DECODES.fetch_add(1, Ordering::SeqCst);
            None
        }
    }

    #[test]
    fn payload_is_decoded_once_and_cached() {
        let mut tree = Tree::new();
        let sound = tree.create_file_with_contents("sound", vec![1, 2, 3]).unwrap();

        assert!(!tree.is_read(sound).unwrap());
        let first = tree.payload::<Sound>(sound).expect("sounds decode") as *const Sound;
        let second = tree.payload::<Sound>(sound).expect("sounds decode") as *const Sound;

        assert_eq!(first, second);
        assert_eq!(SOUND_DECODES.load(Ordering::SeqCst), 1);
        assert_eq!(tree.payload::<Sound>(sound).unwrap().0, vec![1, 2, 3]);
        assert!(tree.is_read(sound).unwrap());
    }

    #[test]
    fn failed_decode_is_not_retried() {
        let mut tree = Tree::new();
        let node = tree.create_file_with_contents("broken", "whatever").unwrap();

        assert!(tree.payload::<Broken>(node).is_none());
        assert!(tree.payload::<Broken>(node).is_none());
        assert_eq!(BROKEN_DECODES.load(Ordering::SeqCst), 1);
        assert!(tree.is_read(node).unwrap());
    }

    #[test]
    fn mismatched_type_yields_none() {
        let mut tree = Tree::new();
        let node = tree.create_file_with_contents("title", "Bouncing ball").unwrap();

        assert_eq!(
            tree.payload::<String>(node).map(String::as_str),
            Some("Bouncing ball")
        );
        assert!(tree.payload::<Vec<u8>>(node).is_none());
        assert!(tree.payload::<Vec<u8>>(node).is_none());
        assert_eq!(
            tree.payload::<String>(node).map(String::as_str),
            Some("Bouncing ball")
        );
    }

    #[test]
    fn first_type_read_wins() {
        let mut tree = Tree::new();
        let node = tree.create_file_with_contents("title", "abc").unwrap();

        assert!(tree.payload::<Vec<u8>>(node).is_some());
        assert!(tree.payload::<String>(node).is_none());
    }

    #[test]
    fn directories_never_decode() {
        let mut tree = Tree::new();
        let dir = tree.create_directory("layers", Vec::new()).unwrap();

        assert!(tree.payload::<Vec<u8>>(dir).is_none());
        assert!(!tree.is_read(dir).unwrap());
    }

    #[test]
    fn stale_handles_yield_none() {
        let mut tree = Tree::new();
        let node = tree.create_file_with_contents("gone", "x").unwrap();
        tree.discard(node).unwrap();

        assert!(tree.payload::<String>(node).is_none());
        assert!(tree.is_read(node).is_err());
    }

    #[test]
    fn payload_round_trips_through_a_file_node() {
        let original = Easing(vec![
            (OrderedFloat(0.0), OrderedFloat(0.0)),
            (OrderedFloat(0.25), OrderedFloat(0.1)),
            (OrderedFloat(1.0), OrderedFloat(1.0)),
        ]);
        let mut tree = Tree::new();
        let node = tree
            .create_file_with_contents("easing", Payload::encode(&original).unwrap())
            .unwrap();

        assert_eq!(tree.payload::<Easing>(node), Some(&original));
    }

    #[test]
    fn update_payload_mutates_and_marks_dirty() {
        let mut tree = Tree::new();
        let node = tree.create_file_with_contents("title", "draft").unwrap();

        let len = tree
            .update_payload::<String, _>(node, |title| {
                title.push_str(" 2");
                title.len()
            })
            .unwrap();

        assert_eq!(len, Some(7));
        assert_eq!(tree.payload::<String>(node).unwrap(), "draft 2");
        assert!(tree.is_dirty(node).unwrap());
    }

    #[test]
    fn update_payload_without_payload_keeps_node_clean() {
        let mut tree = Tree::new();
        let node = tree.create_file_with_contents("binary", vec![0xff]).unwrap();

        let result = tree.update_payload::<String, _>(node, |title| title.clear());

        assert_eq!(result, Ok(None));
        assert!(!tree.is_dirty(node).unwrap());
    }
}
