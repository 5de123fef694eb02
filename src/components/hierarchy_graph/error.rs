use super::types::EdgeKind;

/// The input lists do not describe a tree plus well-formed cross edges.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MalformedGraphError {
	#[error("{kind} edge references unknown node `{id}`")]
	UnknownNode { kind: EdgeKind, id: String },
	#[error("node `{id}` is defined more than once")]
	DuplicateNode { id: String },
	#[error("node `{child}` has two parents: `{first}` and `{second}`")]
	MultipleParents {
		child: String,
		first: String,
		second: String,
	},
	#[error("hierarchy edges form a cycle through node `{id}`")]
	Cycle { id: String },
}

/// Startup failure while fetching or decoding the graph files.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	#[error("failed to fetch {url}: {reason}")]
	Fetch { url: String, reason: String },
	#[error("failed to decode {url}: {source}")]
	Decode {
		url: String,
		#[source]
		source: serde_json::Error,
	},
	#[error(transparent)]
	Malformed(#[from] MalformedGraphError),
}

pub type Result<T, E = MalformedGraphError> = std::result::Result<T, E>;
