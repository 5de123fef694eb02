use leptos::prelude::*;
use leptos::task::spawn_local;
use log::error;

use crate::components::hierarchy_graph::{GraphConfig, GraphModel, HierarchyGraphCanvas, load_graph};

/// Shown instead of the graph when the startup fetch or validation fails.
#[derive(Clone, Debug, thiserror::Error)]
#[error("could not load the class graph: {0}")]
struct StartupFailure(String);

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let config = GraphConfig::default();
	let (graph, set_graph) = signal(None::<Result<GraphModel, StartupFailure>>);

	let source = config.source.clone();
	spawn_local(async move {
		let loaded = load_graph(&source).await.map_err(|e| {
			error!("Startup failed: {e}");
			StartupFailure(e.to_string())
		});
		set_graph.set(Some(loaded));
	});

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-graph">
				{move || match graph.get() {
					None => Ok(view! { <p class="loading">"Loading graph..."</p> }.into_any()),
					Some(Ok(model)) => {
						Ok(
							view! {
								<HierarchyGraphCanvas model=model config=config.clone() fullscreen=true />
							}
								.into_any(),
						)
					}
					Some(Err(failure)) => Err(failure),
				}}
				<div class="graph-overlay">
					<h1>"Class Hierarchy"</h1>
					<p class="subtitle">
						"Click a class to collapse or expand it. Drag nodes to reposition. Scroll to zoom. Drag background to pan."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}
