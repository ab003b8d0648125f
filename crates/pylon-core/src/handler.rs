//! Handler trait for request processing.
//!
//! The [`Handler`] trait is the contract between the pipeline and business
//! code. A handler receives a bound and validated request view and answers
//! with a response view or a [`PylonError`].

use crate::error::PylonResult;
use crate::response::ResponseView;
use std::future::Future;

/// A trait for handling typed requests.
///
/// The pipeline invokes `handle` at most once per request, and only after
/// binding and validation succeeded.
///
/// # Example
///
/// ```rust,ignore
/// use pylon_core::{ErrorKind, Handler, Payload, PylonError, PylonResult};
///
/// struct GetArtist {
///     repo: ArtistRepo,
/// }
///
/// impl Handler<GetArtistRequest, Payload<ArtistBody>> for GetArtist {
///     async fn handle(&self, request: &GetArtistRequest) -> PylonResult<Payload<ArtistBody>> {
///         let artist = self
///             .repo
///             .find(request.id)
///             .ok_or_else(|| PylonError::new(ErrorKind::NotFound))?;
///         Ok(Payload::new(artist.into()))
///     }
/// }
/// ```
pub trait Handler<Req, Res>: Send + Sync + 'static
where
    Req: Send + Sync + 'static,
    Res: ResponseView,
{
    /// Handles a request.
    ///
    /// # Errors
    ///
    /// Returns a classified [`PylonError`](crate::PylonError) for expected
    /// failures (missing entity, bad credentials). Anything else may be
    /// returned unclassified and is answered as an internal error.
    fn handle(&self, request: &Req) -> impl Future<Output = PylonResult<Res>> + Send;
}
