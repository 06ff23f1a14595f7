//! Per-player overlay layer for effect targets.
//!
//! Each player or scrubber owns its own `Overlay`, so several animations on
//! one page never share a layer. Mount/unmount and attach/detach are tracked
//! here and are idempotent: repeated calls do not reach the host surface.

use indexmap::IndexSet;
use log::{debug, trace};
use std::cell::RefCell;
use std::rc::Rc;

use crate::host::{NodeId, Surface};

struct OverlayInner {
    surface: Box<dyn Surface>,
    mounted: bool,
    attached: IndexSet<NodeId>,
}

/// Cloneable handle; clones share the same layer.
#[derive(Clone)]
pub struct Overlay {
    inner: Rc<RefCell<OverlayInner>>,
}

impl std::fmt::Debug for Overlay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Overlay")
            .field("mounted", &inner.mounted)
            .field("attached", &inner.attached)
            .finish()
    }
}

impl Overlay {
    /// Wrap a host surface. Starts unmounted and empty.
    pub fn new(surface: Box<dyn Surface>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(OverlayInner {
                surface,
                mounted: false,
                attached: IndexSet::new(),
            })),
        }
    }

    /// Overlay over a surface that ignores every call.
    pub fn detached() -> Self {
        Self::new(Box::new(NullSurface))
    }

    /// Move the layer to `surface`. Every clone of this handle follows.
    ///
    /// Current mount state and attached nodes are replayed onto the new
    /// surface, so registrations made before the swap keep working.
    pub fn set_surface(&self, mut surface: Box<dyn Surface>) {
        let mut inner = self.inner.borrow_mut();
        if inner.mounted {
            surface.mount();
        }
        for node in &inner.attached {
            surface.append_child(*node);
        }
        debug!("Overlay surface replaced ({} nodes carried over)", inner.attached.len());
        inner.surface = surface;
    }

    pub fn mount(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.mounted {
            return false;
        }
        debug!("Overlay mounted");
        inner.mounted = true;
        inner.surface.mount();
        true
    }

    pub fn unmount(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.mounted {
            return false;
        }
        debug!("Overlay unmounted");
        inner.mounted = false;
        inner.surface.unmount();
        true
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.borrow().mounted
    }

    /// Append `node` to the layer. No-op if already attached.
    pub fn attach(&self, node: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.attached.insert(node) {
            return false;
        }
        trace!("Overlay attach {:?}", node);
        inner.surface.append_child(node);
        true
    }

    /// Remove `node` from the layer. No-op if not attached.
    pub fn detach(&self, node: NodeId) -> bool {
        let mut inner = self.inner.borrow_mut();
        if !inner.attached.shift_remove(&node) {
            return false;
        }
        trace!("Overlay detach {:?}", node);
        inner.surface.remove_child(node);
        true
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.inner.borrow().attached.contains(&node)
    }

    pub fn set_opacity(&self, node: NodeId, opacity: f64) {
        self.inner.borrow_mut().surface.set_opacity(node, opacity.clamp(0.0, 1.0));
    }

    /// Detach everything and unmount.
    pub fn clear(&self) {
        let nodes: Vec<NodeId> = self.inner.borrow().attached.iter().copied().collect();
        for node in nodes {
            self.detach(node);
        }
        self.unmount();
    }
}

struct NullSurface;

impl Surface for NullSurface {
    fn mount(&mut self) {}
    fn unmount(&mut self) {}
    fn append_child(&mut self, _node: NodeId) {}
    fn remove_child(&mut self, _node: NodeId) {}
    fn set_opacity(&mut self, _node: NodeId, _opacity: f64) {}
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub enum SurfaceCall {
        Mount,
        Unmount,
        Append(NodeId),
        Remove(NodeId),
        Opacity(NodeId, f64),
    }

    /// Surface that records every call for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingSurface {
        pub calls: Rc<RefCell<Vec<SurfaceCall>>>,
    }

    impl Surface for RecordingSurface {
        fn mount(&mut self) {
            self.calls.borrow_mut().push(SurfaceCall::Mount);
        }
        fn unmount(&mut self) {
            self.calls.borrow_mut().push(SurfaceCall::Unmount);
        }
        fn append_child(&mut self, node: NodeId) {
            self.calls.borrow_mut().push(SurfaceCall::Append(node));
        }
        fn remove_child(&mut self, node: NodeId) {
            self.calls.borrow_mut().push(SurfaceCall::Remove(node));
        }
        fn set_opacity(&mut self, node: NodeId, opacity: f64) {
            self.calls.borrow_mut().push(SurfaceCall::Opacity(node, opacity));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{RecordingSurface, SurfaceCall};
    use super::*;

    #[test]
    fn test_mount_idempotent() {
        let surface = RecordingSurface::default();
        let overlay = Overlay::new(Box::new(surface.clone()));
        assert!(overlay.mount());
        assert!(!overlay.mount());
        assert!(overlay.unmount());
        assert!(!overlay.unmount());
        assert_eq!(*surface.calls.borrow(), vec![SurfaceCall::Mount, SurfaceCall::Unmount]);
    }

    #[test]
    fn test_attach_detach_idempotent() {
        let surface = RecordingSurface::default();
        let overlay = Overlay::new(Box::new(surface.clone()));
        let node = NodeId(7);
        assert!(overlay.attach(node));
        assert!(!overlay.attach(node));
        assert!(overlay.detach(node));
        assert!(!overlay.detach(node));
        assert_eq!(
            *surface.calls.borrow(),
            vec![SurfaceCall::Append(node), SurfaceCall::Remove(node)]
        );
    }

    #[test]
    fn test_separate_overlays_do_not_interfere() {
        let a = Overlay::detached();
        let b = Overlay::detached();
        a.mount();
        a.attach(NodeId(1));
        assert!(!b.is_mounted());
        assert!(!b.is_attached(NodeId(1)));
    }

    #[test]
    fn test_set_surface_reaches_clones() {
        let overlay = Overlay::detached();
        let handle = overlay.clone();
        overlay.mount();
        overlay.attach(NodeId(5));

        let surface = RecordingSurface::default();
        overlay.set_surface(Box::new(surface.clone()));
        handle.set_opacity(NodeId(5), 0.5);
        handle.detach(NodeId(5));

        assert_eq!(
            *surface.calls.borrow(),
            vec![
                SurfaceCall::Mount,
                SurfaceCall::Append(NodeId(5)),
                SurfaceCall::Opacity(NodeId(5), 0.5),
                SurfaceCall::Remove(NodeId(5)),
            ]
        );
    }

    #[test]
    fn test_clear() {
        let surface = RecordingSurface::default();
        let overlay = Overlay::new(Box::new(surface.clone()));
        overlay.mount();
        overlay.attach(NodeId(1));
        overlay.attach(NodeId(2));
        overlay.clear();
        assert!(!overlay.is_mounted());
        assert_eq!(surface.calls.borrow().len(), 6);
    }
}
