//! Pixel geometry for elements.

use super::GraphState;
use crate::element::{EdgeGeometry, OptionsBatch, PixelBendPoint, ScopedElementConfig, UpdateMode};
use crate::series::NodeUpdate;

impl GraphState {
    /// Update every node element.
    pub(crate) fn update_node_elements(&mut self, mode: UpdateMode) {
        self.element_config.clear_cache();
        let mut update = NodeUpdate {
            x_scale: &*self.x_scale,
            y_scale: &*self.y_scale,
            resolver: &*self.resolver,
            config: &mut self.element_config,
        };
        let count = self.series.len();
        self.series.update_elements(0, count, mode, &mut update);
    }

    /// Update edge elements `start..start + count`.
    ///
    /// Endpoints are the pixel positions of the node elements the edge
    /// connects, so node elements must be updated first. An endpoint that
    /// did not resolve stays `None`. Bend points go through the scales, or
    /// collapse onto the base pixel in reset mode.
    pub(crate) fn update_edge_elements(&mut self, start: usize, count: usize, mode: UpdateMode) {
        let end = start.saturating_add(count).min(self.edge_elements.len());
        if start >= end {
            return;
        }

        let mut config = ScopedElementConfig::enter(&mut self.element_config, &mut self.edge_config);
        let resolver = &*self.resolver;
        let batch = OptionsBatch::begin(&mut config, resolver, start, mode);

        let (x_scale, y_scale) = (&*self.x_scale, &*self.y_scale);
        let base = (x_scale.base_pixel(), y_scale.base_pixel());
        let reset = mode == UpdateMode::Reset;

        for index in start..end {
            let geometry = match self.parsed_edges.get(index) {
                Some(parsed) => EdgeGeometry {
                    source: parsed.source.and_then(|node| self.series.position(node)),
                    target: parsed.target.and_then(|node| self.series.position(node)),
                    points: parsed
                        .points
                        .iter()
                        .map(|point| {
                            let (x, y) = if reset {
                                base
                            } else {
                                (x_scale.pixel_for_value(point.x, 0), y_scale.pixel_for_value(point.y, 0))
                            };
                            PixelBendPoint { x, y, angle: point.angle }
                        })
                        .collect(),
                },
                None => EdgeGeometry::default(),
            };
            let options = batch.options_for(&mut config, resolver, index);
            self.edge_elements[index].update(geometry, Some(options), mode);
        }
    }
}
