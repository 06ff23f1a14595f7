//! Scroll-synchronized fade/reveal effects on overlay nodes.
//!
//! A fade is a range registration whose target lives on the owner's
//! `Overlay`: entering the window attaches the node, every tick inside
//! updates its opacity, leaving hides and detaches it.

use indexmap::IndexMap;
use log::{error, info};

use crate::config::RangeConfig;
use crate::core::ranges::{RangeDispatcher, RangeId, RangePhase, RangeSpec};
use crate::entities::overlay::Overlay;
use crate::error::Result;
use crate::host::NodeId;

/// Register a fade of `node` across `spec`.
///
/// The node starts hidden. With `spec.smooth` the opacity follows
/// `ease_out_expo(linear_gradient)`, otherwise it is fully opaque in range.
pub fn register_fade(
    ranges: &mut RangeDispatcher,
    overlay: &Overlay,
    node: NodeId,
    spec: RangeSpec,
) -> Result<RangeId> {
    spec.validate()?;
    overlay.set_opacity(node, 0.0);

    let on_update = overlay.clone();
    let on_exit = overlay.clone();
    ranges.register(
        spec,
        move |event| {
            if event.phase == RangePhase::Entered {
                on_update.attach(node);
            }
            on_update.set_opacity(node, event.opacity);
        },
        move |_| {
            on_exit.set_opacity(node, 0.0);
            on_exit.detach(node);
        },
    )
}

/// Register fades for every named target in a config map.
///
/// `resolve` maps a target name (e.g. `"#test"`) to a host node. Unknown
/// names are logged and skipped; an invalid window aborts the whole set.
pub fn register_named<F>(
    ranges: &mut RangeDispatcher,
    overlay: &Overlay,
    targets: &IndexMap<String, RangeConfig>,
    mut resolve: F,
) -> Result<Vec<(String, RangeId)>>
where
    F: FnMut(&str) -> Option<NodeId>,
{
    let mut registered = Vec::with_capacity(targets.len());
    for (name, range) in targets {
        let Some(node) = resolve(name) else {
            error!("Could not find effect target: {}", name);
            continue;
        };
        let id = register_fade(ranges, overlay, node, range.spec())?;
        registered.push((name.clone(), id));
    }
    info!("Registered {} effect targets", registered.len());
    Ok(registered)
}
