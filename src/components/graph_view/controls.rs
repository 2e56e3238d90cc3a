//! Zoom slider and fit button overlaid on the editor.

use std::rc::Rc;

use leptos::prelude::*;

use super::viewport::ZoomSlider;

#[component]
pub fn GraphControls(
	/// Current zoom factor.
	#[prop(into)]
	zoom: Signal<f64>,
	min_zoom: f64,
	max_zoom: f64,
	/// Called with the zoom delta the slider asks for.
	on_zoom: Rc<dyn Fn(f64)>,
	on_fit: Rc<dyn Fn()>,
) -> impl IntoView {
	let slider = ZoomSlider::new(min_zoom, max_zoom);

	let on_input = move |ev: web_sys::Event| {
		let Ok(value) = event_target_value(&ev).parse::<f64>() else {
			return;
		};
		if let Some(delta) = slider.delta_for(value, zoom.get_untracked()) {
			on_zoom(delta);
		}
	};

	view! {
		<div
			class="graph-controls"
			style="position: absolute; bottom: 30px; left: 15px; display: flex; align-items: center; gap: 8px; padding: 6px 10px; background: rgba(255, 255, 255, 0.9); border-radius: 4px;"
		>
			<span class="slider-label">"-"</span>
			<input
				type="range"
				class="slider"
				min="0"
				max=slider.steps
				step="1"
				prop:value=move || slider.zoom_to_slider(zoom.get())
				on:input=on_input
			/>
			<span class="slider-label">"+"</span>
			<button type="button" class="fit" title="Fit to view" on:click=move |_| on_fit()>
				"Fit"
			</button>
		</div>
	}
}
