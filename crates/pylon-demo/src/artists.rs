//! Artist catalog endpoints.

use http::StatusCode;
use pylon_bind::{FieldSpec, PrimitiveKind, RequestView, Rule, Shape};
use pylon_core::{Empty, ErrorKind, Handler, Payload, PylonError, PylonResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::store::ArtistRepository;

/// Longest accepted artist name, in characters.
pub const MAX_NAME_LENGTH: usize = 255;

/// JSON body of `POST /artists`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateArtistBody {
    /// Display name.
    pub name: String,
}

/// `POST /artists`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateArtistRequest {
    /// Request body.
    pub body: CreateArtistBody,
}

impl RequestView for CreateArtistRequest {
    fn shape() -> Shape {
        Shape::new("CreateArtistRequest").with_body().field(
            FieldSpec::body("body.name")
                .rule(Rule::Required)
                .rule(Rule::MaxLength(MAX_NAME_LENGTH)),
        )
    }
}

/// `GET /artists/{id}`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GetArtistRequest {
    /// Artist id.
    pub id: u32,
}

impl RequestView for GetArtistRequest {
    fn shape() -> Shape {
        Shape::new("GetArtistRequest")
            .field(FieldSpec::path("id", PrimitiveKind::U32).rule(Rule::Required))
    }
}

/// `DELETE /artists/{id}`
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteArtistRequest {
    /// Artist id.
    pub id: u32,
}

impl RequestView for DeleteArtistRequest {
    fn shape() -> Shape {
        Shape::new("DeleteArtistRequest")
            .field(FieldSpec::path("id", PrimitiveKind::U32).rule(Rule::Required))
    }
}

/// Answer to a successful creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistCreated {
    /// Assigned id.
    pub id: u32,
}

/// An artist as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtistView {
    /// Artist id.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// Creates artists.
pub struct CreateArtist {
    repo: Arc<dyn ArtistRepository>,
}

impl CreateArtist {
    /// Creates the handler over `repo`.
    pub fn new(repo: Arc<dyn ArtistRepository>) -> Self {
        Self { repo }
    }
}

impl Handler<CreateArtistRequest, Payload<ArtistCreated>> for CreateArtist {
    async fn handle(&self, request: &CreateArtistRequest) -> PylonResult<Payload<ArtistCreated>> {
        let artist = self.repo.create(&request.body.name)?;
        tracing::info!(artist_id = artist.id, "artist created");
        Ok(Payload::new(ArtistCreated { id: artist.id }))
    }
}

/// Fetches one artist.
pub struct GetArtist {
    repo: Arc<dyn ArtistRepository>,
}

impl GetArtist {
    /// Creates the handler over `repo`.
    pub fn new(repo: Arc<dyn ArtistRepository>) -> Self {
        Self { repo }
    }
}

impl Handler<GetArtistRequest, Payload<ArtistView>> for GetArtist {
    async fn handle(&self, request: &GetArtistRequest) -> PylonResult<Payload<ArtistView>> {
        let artist = self.repo.get(request.id)?.ok_or_else(|| {
            PylonError::with_detail(ErrorKind::NotFound, format!("artist {} not found", request.id))
        })?;
        Ok(Payload::new(ArtistView {
            id: artist.id,
            name: artist.name,
        }))
    }
}

/// Removes one artist.
pub struct DeleteArtist {
    repo: Arc<dyn ArtistRepository>,
}

impl DeleteArtist {
    /// Creates the handler over `repo`.
    pub fn new(repo: Arc<dyn ArtistRepository>) -> Self {
        Self { repo }
    }
}

impl Handler<DeleteArtistRequest, Empty> for DeleteArtist {
    async fn handle(&self, request: &DeleteArtistRequest) -> PylonResult<Empty> {
        self.repo.delete(request.id)?;
        tracing::info!(artist_id = request.id, "artist deleted");
        Ok(Empty(StatusCode::OK))
    }
}
