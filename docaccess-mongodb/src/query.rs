//! Translation from docaccess read options to driver options.

use bson::{Bson, Document, doc};
use mongodb::options::FindOptions as MongoFindOptions;

use docaccess_core::query::{FieldLookup, FindOptions};

/// Name of the projected relevance score in text-search lookups.
const SCORE_FIELD: &str = "score";

/// Builds a sort document, keys in the caller's order.
pub(crate) fn sort_document(options: &FindOptions) -> Option<Document> {
    if options.sort.is_empty() {
        return None;
    }

    Some(Document::from_iter(
        options.sort
            .iter()
            .map(|sort| (sort.field.clone(), Bson::Int32(sort.direction.as_i32()))),
    ))
}

pub(crate) fn find_options(options: &FindOptions) -> MongoFindOptions {
    let mut translated = MongoFindOptions::default();

    translated.sort = sort_document(options);
    translated.limit = options.limit.map(|limit| i64::try_from(limit).unwrap_or(i64::MAX));

    translated
}

/// Options for a single-field lookup: one document, only the wanted field,
/// best text score first when the filter is a text search.
pub(crate) fn field_options(lookup: &FieldLookup) -> MongoFindOptions {
    let mut translated = MongoFindOptions::default();
    translated.limit = Some(1);

    if lookup.is_text_search() {
        translated.projection = Some(doc! {
            lookup.field.clone(): 1,
            SCORE_FIELD: { "$meta": "textScore" },
        });
        translated.sort = Some(doc! { SCORE_FIELD: { "$meta": "textScore" } });
    } else {
        translated.projection = Some(doc! { lookup.field.clone(): 1 });
    }

    translated
}
