//! Previous/next post resolution.
//!
//! Neighbours are found with two independent single-result queries anchored
//! on the current document with `after`: walking the publication order
//! backwards finds the nearest earlier post, walking it forwards finds the
//! nearest later one.

use crate::cms::{
    CmsError, DocumentClient, FIRST_PUBLICATION_DATE, Ordering, Predicate, QueryOptions,
    RawDocument,
};
use crate::projection::project_post;
use crate::types::{Adjacent, AdjacentPostRef};
use tracing::debug;

/// Resolve the chronological neighbours of `document_id`.
///
/// `reference` is the preview ref, passed through unchanged.
pub async fn resolve<C>(
    client: &C,
    doc_type: &str,
    document_id: &str,
    reference: Option<&str>,
) -> Result<Adjacent, CmsError>
where
    C: DocumentClient + ?Sized,
{
    let prev = neighbour(
        client,
        doc_type,
        document_id,
        reference,
        Ordering::desc(FIRST_PUBLICATION_DATE),
    )
    .await?;
    let next = neighbour(
        client,
        doc_type,
        document_id,
        reference,
        Ordering::asc(FIRST_PUBLICATION_DATE),
    )
    .await?;
    debug!(
        document_id,
        prev = prev.as_ref().map(|p| p.uid.as_str()),
        next = next.as_ref().map(|n| n.uid.as_str()),
        "resolved neighbours"
    );
    Ok(Adjacent { prev, next })
}

async fn neighbour<C>(
    client: &C,
    doc_type: &str,
    document_id: &str,
    reference: Option<&str>,
    ordering: Ordering,
) -> Result<Option<AdjacentPostRef>, CmsError>
where
    C: DocumentClient + ?Sized,
{
    let options = QueryOptions {
        page_size: Some(1),
        reference: reference.map(str::to_string),
        after: Some(document_id.to_string()),
        orderings: vec![ordering],
        fetch: vec![format!("{doc_type}.title")],
    };
    let response = client
        .query(&[Predicate::document_type(doc_type)], &options)
        .await?;
    response.results.first().map(adjacent_ref).transpose()
}

fn adjacent_ref(doc: &RawDocument) -> Result<AdjacentPostRef, CmsError> {
    let post = project_post(doc)?;
    Ok(AdjacentPostRef {
        uid: post.uid,
        title: post.title,
    })
}
