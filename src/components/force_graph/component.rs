use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::ForceGraphState;
use crate::graph::DisplayGraph;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Handles shared between the mount effect, the frame loop and the event handlers.
#[derive(Clone, Default)]
struct Shared {
	state: Rc<RefCell<Option<ForceGraphState>>>,
	animate: FrameCallback,
	resize_cb: FrameCallback,
}

impl Shared {
	/// Drops the simulation and both callbacks, breaking the frame loop's
	/// `Rc` cycle. Never call this from inside the frame callback.
	fn release(&self) {
		self.state.borrow_mut().take();
		let frame = self.animate.borrow_mut().take();
		drop(frame);
		let resize = self.resize_cb.borrow_mut().take();
		drop(resize);
	}
}

fn js_error(message: &str) -> JsValue {
	JsValue::from_str(message)
}

fn describe(err: &JsValue) -> String {
	err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn window_size(window: &Window) -> Result<(f64, f64), JsValue> {
	let w = window.inner_width()?.as_f64().unwrap_or(800.0);
	let h = window.inner_height()?.as_f64().unwrap_or(600.0);
	Ok((w, h))
}

fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d, JsValue> {
	canvas
		.get_context("2d")?
		.ok_or_else(|| js_error("canvas has no 2d context"))?
		.dyn_into::<CanvasRenderingContext2d>()
		.map_err(|_| js_error("2d context has an unexpected type"))
}

/// Sizes the canvas, builds the simulation and starts the frame loop.
/// The loop ends on the first frame after `alive` is cleared.
fn start(
	canvas: HtmlCanvasElement,
	display: &DisplayGraph,
	size: (bool, Option<f64>, Option<f64>),
	shared: &Shared,
	alive: Arc<AtomicBool>,
) -> Result<(), JsValue> {
	let (fullscreen, width, height) = size;
	let window = web_sys::window().ok_or_else(|| js_error("no browser window"))?;

	let (w, h) = if fullscreen {
		window_size(&window)?
	} else {
		let parent = canvas.parent_element();
		(
			width.unwrap_or_else(|| parent.as_ref().map(|p| p.client_width() as f64).unwrap_or(800.0)),
			height.unwrap_or_else(|| parent.as_ref().map(|p| p.client_height() as f64).unwrap_or(600.0)),
		)
	};
	canvas.set_width(w as u32);
	canvas.set_height(h as u32);

	let ctx = context_2d(&canvas)?;
	*shared.state.borrow_mut() = Some(ForceGraphState::new(display, w, h));
	debug!("force graph: mounted {}x{} with {} nodes", w, h, display.graph.nodes.len());

	if fullscreen {
		let (state_resize, canvas_resize) = (shared.state.clone(), canvas.clone());
		*shared.resize_cb.borrow_mut() = Some(Closure::new(move || {
			let Some(Ok((nw, nh))) = web_sys::window().map(|win| window_size(&win)) else {
				return;
			};
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		}));
		if let Some(ref cb) = *shared.resize_cb.borrow() {
			window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref())?;
		}
	}

	let inner = shared.clone();
	*shared.animate.borrow_mut() = Some(Closure::new(move || {
		let Some(win) = web_sys::window() else {
			return;
		};
		if !alive.load(Ordering::Relaxed) {
			if let Some(ref cb) = *inner.resize_cb.borrow() {
				let _ = win.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
			debug!("force graph: frame loop stopped");
			// runs after this callback returns
			let teardown = inner.clone();
			spawn_local(async move { teardown.release() });
			return;
		}
		if let Some(ref mut s) = *inner.state.borrow_mut() {
			if s.animation_running {
				s.tick(0.016);
			}
			render::render(s, &ctx);
		}
		if let Some(ref cb) = *inner.animate.borrow() {
			let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	}));
	if let Some(ref cb) = *shared.animate.borrow() {
		window.request_animation_frame(cb.as_ref().unchecked_ref())?;
	}
	Ok(())
}

fn pointer(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

/// Interactive force-directed view of a [`DisplayGraph`].
///
/// Rebuilds the simulation whenever `data` changes, keeping pan and zoom.
/// Canvas failures are shown inline instead of the graph.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] data: Signal<DisplayGraph>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let shared = Shared::default();
	let alive = Arc::new(AtomicBool::new(true));
	let failure = RwSignal::new(None::<String>);
	let tooltip = RwSignal::new(None::<(String, f64, f64)>);

	let alive_cleanup = alive.clone();
	on_cleanup(move || alive_cleanup.store(false, Ordering::Relaxed));

	let shared_init = shared.clone();
	Effect::new(move |_| {
		let display = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		if let Some(ref mut s) = *shared_init.state.borrow_mut() {
			s.replace(&display);
			debug!("force graph: rebuilt with {} nodes", s.node_count());
			return;
		}
		if failure.get_untracked().is_some() {
			return;
		}
		if let Err(e) = start(canvas.into(), &display, (fullscreen, width, height), &shared_init, alive.clone()) {
			let message = describe(&e);
			error!("force graph: {message}");
			failure.set(Some(message));
		}
	});

	let state_md = shared.state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = shared.state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
				tooltip.set(s.hovered_tooltip().map(|text| (text, x, y)));
			}

			if s.drag.active {
				if let Some(idx) = s.drag.node_idx {
					let (dx, dy) = ((x - s.drag.start_x) / s.transform.k, (y - s.drag.start_y) / s.transform.k);
					let (nx, ny) = (s.drag.node_start_x + dx as f32, s.drag.node_start_y + dy as f32);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let state_mu = shared.state.clone();
	let on_mouseup = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
	};

	let state_ml = shared.state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
		}
		tooltip.set(None);
	};

	let state_wh = shared.state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	view! {
		<div class="force-graph" style="position: relative; width: 100%; height: 100%;">
			{move || {
				failure
					.get()
					.map(|message| {
						view! {
							<div class="graph-error" role="alert">
								<strong>"The graph could not be drawn."</strong>
								<p>{message}</p>
							</div>
						}
					})
			}}
			<canvas
				node_ref=canvas_ref
				class="force-graph-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				style="display: block; cursor: grab;"
			/>
			{move || {
				tooltip
					.get()
					.map(|(text, x, y)| {
						let style = format!(
							"position: absolute; left: {}px; top: {}px; white-space: pre; pointer-events: none;",
							x + 12.0,
							y + 12.0,
						);
						view! { <div class="graph-tooltip" style=style>{text}</div> }
					})
			}}
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::graph::{AggregateOptions, RawAssociationRecord, aggregate};

	#[test]
	fn release_frees_the_simulation_for_every_handle() {
		let records = [RawAssociationRecord::new("Arial", "calm", 2)];
		let display = DisplayGraph::plain(aggregate(&records, &AggregateOptions::default()));
		let shared = Shared::default();
		*shared.state.borrow_mut() = Some(ForceGraphState::new(&display, 400.0, 300.0));
		let frame_loop_handle = shared.clone();

		shared.release();

		assert!(frame_loop_handle.state.borrow().is_none());
		assert!(frame_loop_handle.animate.borrow().is_none());
		assert!(frame_loop_handle.resize_cb.borrow().is_none());
		assert_eq!(Rc::strong_count(&shared.state), 2);
	}
}
