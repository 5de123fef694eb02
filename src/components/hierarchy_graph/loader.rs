//! One-shot startup fetch of the graph files. No retries: any failure is fatal
//! and reported by the page.

use log::{debug, info};
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::config::DataSource;
use super::error::LoadError;
use super::model::GraphModel;
use super::types::GraphData;

async fn fetch_text(url: &str) -> Result<String, LoadError> {
	let fail = |reason: String| LoadError::Fetch {
		url: url.to_string(),
		reason,
	};

	let opts = RequestInit::new();
	opts.set_method("GET");
	let request = Request::new_with_str_and_init(url, &opts)
		.map_err(|e| fail(format!("request error: {e:?}")))?;
	let window = web_sys::window().ok_or_else(|| fail("no window".into()))?;
	let resp: Response = JsFuture::from(window.fetch_with_request(&request))
		.await
		.map_err(|e| fail(format!("{e:?}")))?
		.dyn_into()
		.map_err(|_| fail("response is not a Response".into()))?;
	if !resp.ok() {
		return Err(fail(format!("HTTP {}", resp.status())));
	}
	let text = JsFuture::from(resp.text().map_err(|e| fail(format!("{e:?}")))?)
		.await
		.map_err(|e| fail(format!("{e:?}")))?;
	text.as_string()
		.ok_or_else(|| fail("response body is not text".into()))
}

pub(crate) fn decode<T: DeserializeOwned>(url: &str, body: &str) -> Result<T, LoadError> {
	serde_json::from_str(body).map_err(|source| LoadError::Decode {
		url: url.to_string(),
		source,
	})
}

async fn fetch_json<T: DeserializeOwned>(url: &str) -> Result<T, LoadError> {
	let body = fetch_text(url).await?;
	debug!("Fetched {} ({} bytes)", url, body.len());
	decode(url, &body)
}

pub async fn fetch_graph_data(source: &DataSource) -> Result<GraphData, LoadError> {
	Ok(GraphData {
		nodes: fetch_json(&source.nodes_url).await?,
		parent_links: fetch_json(&source.parent_links_url).await?,
		shared_ptr_links: fetch_json(&source.shared_ptr_links_url).await?,
	})
}

/// Fetches and validates the graph. A malformed graph never reaches the layout.
pub async fn load_graph(source: &DataSource) -> Result<GraphModel, LoadError> {
	let data = fetch_graph_data(source).await?;
	let model = GraphModel::from_data(&data)?;
	info!(
		"Loaded {} nodes, {} hierarchy and {} ownership edges",
		data.nodes.len(),
		data.parent_links.len(),
		data.shared_ptr_links.len()
	);
	Ok(model)
}

#[cfg(test)]
mod tests {
	use super::super::error::MalformedGraphError;
	use super::super::layout::ForceConfig;
	use super::super::render::Scene;
	use super::super::session::GraphSession;
	use super::super::types::{NodeRecord, ParentLinkRecord, Point};
	use super::super::visibility::ColorClass;
	use super::*;

	fn bundled() -> GraphData {
		let nodes = include_str!("../../../data/nodes.json");
		let parents = include_str!("../../../data/parent_links.json");
		let owners = include_str!("../../../data/shared_ptr_links.json");
		GraphData {
			nodes: decode("nodes.json", nodes).unwrap(),
			parent_links: decode("parent_links.json", parents).unwrap(),
			shared_ptr_links: decode("shared_ptr_links.json", owners).unwrap(),
		}
	}

	#[test]
	fn decode_reports_url_on_bad_json() {
		let err = decode::<Vec<NodeRecord>>("nodes.json", "{not json").unwrap_err();
		assert!(matches!(err, LoadError::Decode { ref url, .. } if url == "nodes.json"));
		assert!(err.to_string().starts_with("failed to decode nodes.json"));
	}

	#[test]
	fn decode_rejects_link_missing_a_field() {
		let result = decode::<Vec<ParentLinkRecord>>("parent_links.json", r#"[{"parent": "A"}]"#);
		assert!(result.is_err());
	}

	#[test]
	fn malformed_graph_converts_into_load_error() {
		let err: LoadError = MalformedGraphError::DuplicateNode { id: "A".into() }.into();
		assert_eq!(err.to_string(), "node `A` is defined more than once");
	}

	#[test]
	fn bundled_graph_is_well_formed() {
		let model = GraphModel::from_data(&bundled()).unwrap();
		assert_eq!(model.node_count(), 9);
		assert_eq!(model.all_edges().count(), 11);
		let root = model.lookup("Object").unwrap();
		assert_eq!(model.color_class_for(root), ColorClass::Root);
		let shape = model.node(model.lookup("Shape").unwrap());
		assert_eq!(shape.attributes["header"], "shape.h");
	}

	#[test]
	fn exploring_the_bundled_graph() {
		let model = GraphModel::from_data(&bundled()).unwrap();
		let force = ForceConfig {
			center: Point::new(512.0, 384.0),
			..ForceConfig::default()
		};
		let mut session = GraphSession::new(model, force);
		let mut scene = Scene::new(20.0, 8.0);
		scene.present(session.model(), &session.displayed());
		assert_eq!(scene.node_count(), 9);

		for _ in 0..50 {
			session.tick(0.016);
		}

		let root = session.model().lookup("Object").unwrap();
		let collapsed = session.click(root, false).unwrap();
		let diff = scene.present(session.model(), &collapsed);
		assert_eq!(collapsed.nodes, vec![root]);
		assert_eq!(diff.exited_nodes.len(), 8);
		assert_eq!(scene.edge_count(), 0);

		let expanded = session.click(root, false).unwrap();
		let diff = scene.present(session.model(), &expanded);
		assert_eq!(diff.entered_nodes.len(), 3);
		// Canvas -> Brush is the only ownership edge between the direct children.
		assert_eq!(scene.edge_count(), 4);
		for name in ["Shape", "Canvas"] {
			let idx = session.model().lookup(name).unwrap();
			assert_eq!(session.model().color_class_for(idx), ColorClass::Collapsed);
		}
	}
}
