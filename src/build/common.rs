//! Shared condition helpers: the per-model optional filters and the
//! predicate generators they are built from.
use crate::constants::{
    DESC_SOURCE_TYPES, IMAGE_CONTENT_TYPES, IMAGE_EXTENSIONS, IMAGE_SIZES, IMAGE_SIZE_PIXELS,
    Rank, ALL_RANK_NAMES,
};
use crate::date::{self, DateVal};
use crate::google::{self, GoogleSearch};
use crate::lookup::{resolve_filter_set, Store};
use crate::metadata::Model;
use crate::params::Value;
use crate::query::{id_set, Query};
use crate::result::{QueryError, QueryResult};
use crate::util::strip_squeeze;

/// Fetch a parameter the schema marks required.  Validation guarantees its
/// presence; this keeps the guarantee visible to the compiler.
pub(crate) fn required_param(q: &Query, name: &str) -> QueryResult<Value> {
    q.params
        .get(name)
        .cloned()
        .ok_or_else(|| QueryError::MissingParam(name.to_string()))
}

/// Prefix a bare column with the query's base table.
pub(crate) fn qualify(q: &Query, col: &str) -> String {
    if col.contains('.') || col.contains('(') {
        col.to_string()
    } else {
        format!("{}.{}", q.model().table(), col)
    }
}

/// Optional boolean filter: emit one of two fixed conditions.
pub(crate) fn do_boolean(q: &mut Query, param: &str, true_cond: &str, false_cond: &str) {
    if let Some(flag) = q.params.get_bool(param) {
        let cond = if flag { true_cond } else { false_cond };
        q.add_where(cond.to_string());
    }
}

/// Generate LIKE conditions for a parsed search over one field expression.
pub(crate) fn google_conditions(q: &mut Query, search: &GoogleSearch, field: &str) {
    let (frags, binds) = google_condition_frags(search, field);
    for frag in frags {
        q.add_where(frag);
    }
    q.binds.extend(binds);
}

/// Same, but returning the fragments and bound values for callers that
/// assemble alternate execution plans.
pub(crate) fn google_condition_frags(
    search: &GoogleSearch,
    field: &str,
) -> (Vec<String>, Vec<String>) {
    let mut ands = Vec::new();
    let mut binds = Vec::new();

    for good in &search.goods {
        let ors: Vec<String> = good.iter().map(|_| format!("{field} ILIKE ?")).collect();
        for alt in good {
            binds.push(format!("%{}%", google::clean_pattern(alt)));
        }
        if ors.len() > 1 {
            ands.push(format!("({})", ors.join(" OR ")));
        } else {
            ands.push(ors.into_iter().next().unwrap_or_default());
        }
    }

    for bad in &search.bads {
        ands.push(format!("{field} NOT ILIKE ?"));
        binds.push(format!("%{}%", google::clean_pattern(bad)));
    }

    if ands.is_empty() {
        return (Vec::new(), Vec::new());
    }
    (vec![ands.join(" AND ")], binds)
}

/// Optional text-search filter over one column or expression.
pub(crate) fn do_search(q: &mut Query, param: &str, col: &str) -> QueryResult<()> {
    if let Some(pattern) = q.params.get_str(param).map(str::to_string) {
        let field = qualify(q, col);
        let search = google::parse(&pattern)?;
        google_conditions(q, &search, &field);
    }
    Ok(())
}

/// Optional numeric range filter.  Bounds are validated floats, embedded
/// directly.
pub(crate) fn do_range(q: &mut Query, param: &str, col: &str) {
    let (min, max) = q.params.get_float_pair(param);
    let col = qualify(q, col);
    if let Some(min) = min {
        q.add_where(format!("{col} >= {min}"));
    }
    if let Some(max) = max {
        q.add_where(format!("{col} <= {max}"));
    }
}

/// Optional membership filter over a fixed string vocabulary.  The
/// parameter is a space-separated list; unknown entries are dropped and the
/// matched strings are bound.
pub(crate) fn do_enum_set_str(q: &mut Query, param: &str, col: &str, vocab: &[&str]) {
    let val = match q.params.get_str(param) {
        Some(v) => strip_squeeze(v),
        None => return,
    };
    let col = qualify(q, col);

    let matched: Vec<String> = val
        .split(' ')
        .filter(|w| vocab.contains(w))
        .map(str::to_string)
        .collect();
    if matched.is_empty() {
        return;
    }

    let marks: Vec<&str> = matched.iter().map(|_| "?").collect();
    q.add_where_binds(format!("{col} IN ({})", marks.join(",")), matched);
}

/// Same, over a vocabulary stored as integers.
pub(crate) fn do_enum_set_int(q: &mut Query, param: &str, col: &str, vocab: &[(&str, i64)]) {
    let val = match q.params.get_str(param) {
        Some(v) => strip_squeeze(v),
        None => return,
    };
    let col = qualify(q, col);

    let ints: Vec<i64> = val
        .split(' ')
        .filter_map(|w| vocab.iter().find(|(name, _)| *name == w).map(|(_, n)| *n))
        .collect();
    if ints.is_empty() {
        return;
    }

    q.add_where(format!("{col} IN ({})", int_set(&ints)));
}

/// Render an integer list for an IN clause without deduplication concerns.
fn int_set(ints: &[i64]) -> String {
    ints.iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Filter by a list of object ids.
pub(crate) fn do_objects_by_id(q: &mut Query, param: &str, col: &str) {
    if let Some(ids) = q.params.get_id_list(param) {
        let col = qualify(q, col);
        q.add_where(format!("{col} IN ({})", id_set(&ids)));
    }
}

/// Expansion applied to resolved name ids before filtering.
#[derive(Clone, Copy, PartialEq)]
pub(crate) enum NameFilter {
    None,
    Synonyms,
    AllChildren,
}

/// Filter by a list of object references given as ids or lookup strings.
/// Ambiguous strings contribute their full match set.
pub(crate) fn do_objects_by_name(
    q: &mut Query,
    store: &mut dyn Store,
    model: Model,
    param: &str,
    col: &str,
    filter: NameFilter,
    join: &[&str],
) -> QueryResult<()> {
    let vals = match q.params.get_list(param) {
        Some(v) if !v.is_empty() => v.to_vec(),
        _ => return Ok(()),
    };

    let mut ids = resolve_filter_set(store, model, &vals)?;

    match filter {
        NameFilter::None => (),
        NameFilter::Synonyms => {
            let mut expanded = Vec::new();
            for id in &ids {
                expanded.extend(store.name_synonym_ids(*id)?);
            }
            ids = expanded;
        }
        NameFilter::AllChildren => {
            let mut expanded = Vec::new();
            for id in &ids {
                expanded.extend(store.name_children_ids(*id, true)?);
            }
            ids = expanded;
        }
    }
    ids.sort_unstable();
    ids.dedup();

    if !join.is_empty() {
        q.add_join(join);
    }

    let col = qualify(q, col);
    q.add_where(format!("{col} IN ({})", id_set(&ids)));
    Ok(())
}

/// Filter by location references.  Defined locations match by id; free-form
/// entries additionally match the denormalized "where" string.
pub(crate) fn do_locations(
    q: &mut Query,
    store: &mut dyn Store,
    table: &str,
    join: &[&str],
) -> QueryResult<()> {
    let vals = match q.params.get_list("locations") {
        Some(v) if !v.is_empty() => v.to_vec(),
        _ => return Ok(()),
    };

    let ids = resolve_filter_set(store, Model::Location, &vals)?;

    let mut cond = format!("{table}.location_id IN ({})", id_set(&ids));
    let mut binds = Vec::new();
    for val in &vals {
        if let Value::Str(name) = val {
            if !name.chars().all(|c| c.is_ascii_digit()) {
                cond += &format!(" OR {table}.where ILIKE ?");
                binds.push(format!("%{}%", google::clean_pattern(name)));
            }
        }
    }

    if !join.is_empty() {
        q.add_join(join);
    }
    q.add_where_binds(cond, binds);
    Ok(())
}

/// Optional time-range filter over a timestamp column.
pub(crate) fn do_time(q: &mut Query, param: &str, col: &str) -> QueryResult<()> {
    let (min, max) = q.params.get_str_pair(param);
    let min = min.map(str::to_string);
    let max = max.map(str::to_string);
    let col = qualify(q, col);
    time_half(q, true, min.as_deref(), &col)?;
    time_half(q, false, max.as_deref(), &col)?;
    Ok(())
}

fn time_half(q: &mut Query, min: bool, val: Option<&str>, col: &str) -> QueryResult<()> {
    let val = match val {
        Some(v) => v,
        None => return Ok(()),
    };
    let time = match date::parse_time(val).map_err(QueryError::Message)? {
        Some(t) => t,
        None => return Ok(()),
    };
    let dir = if min { ">=" } else { "<=" };
    q.add_where_binds(format!("{col} {dir} ?"), vec![time.bound(min)]);
    Ok(())
}

/// Optional date-range filter.  A pair of month-day values where the end
/// precedes the start is treated as a range wrapping around the new year.
pub(crate) fn do_date(q: &mut Query, param: &str, col: &str) -> QueryResult<()> {
    let (min, max) = q.params.get_str_pair(param);
    let col = qualify(q, col);

    let min_val = parse_date_param(min)?;
    let max_val = parse_date_param(max)?;

    if let (Some(DateVal::Md { m: m1, d: d1 }), Some(DateVal::Md { m: m2, d: d2 })) =
        (min_val, max_val)
    {
        let (d1, d2) = (d1.unwrap_or(1), d2.unwrap_or(31));
        if (m1, d1) > (m2, d2) {
            q.add_where(format!(
                "EXTRACT(MONTH FROM {col}) > {m1} OR EXTRACT(MONTH FROM {col}) < {m2} OR \
                 (EXTRACT(MONTH FROM {col}) = {m1} AND EXTRACT(DAY FROM {col}) >= {d1}) OR \
                 (EXTRACT(MONTH FROM {col}) = {m2} AND EXTRACT(DAY FROM {col}) <= {d2})"
            ));
            return Ok(());
        }
    }

    date_half(q, true, min_val, &col);
    date_half(q, false, max_val, &col);
    Ok(())
}

fn parse_date_param(val: Option<&str>) -> QueryResult<Option<DateVal>> {
    match val {
        Some(v) => date::parse_date(v).map_err(QueryError::Message),
        None => Ok(None),
    }
}

fn date_half(q: &mut Query, min: bool, val: Option<DateVal>, col: &str) {
    let val = match val {
        Some(v) => v,
        None => return,
    };
    let dir = if min { ">" } else { "<" };
    match val {
        DateVal::Ymd { .. } => {
            let bound = if min { val.min_bound() } else { val.max_bound() };
            if let Some(bound) = bound {
                q.add_where_binds(format!("{col} {dir}= ?"), vec![bound]);
            }
        }
        DateVal::Md { m, d: Some(d) } => {
            q.add_where(format!(
                "EXTRACT(MONTH FROM {col}) {dir} {m} OR \
                 (EXTRACT(MONTH FROM {col}) = {m} AND EXTRACT(DAY FROM {col}) {dir}= {d})"
            ));
        }
        DateVal::Md { m, d: None } => {
            q.add_where(format!("EXTRACT(MONTH FROM {col}) {dir}= {m}"));
        }
    }
}

/// Rank-range filter for name queries.
pub(crate) fn do_rank(q: &mut Query) {
    let (min, max) = q.params.get_str_pair("rank");
    if min.is_none() && max.is_none() {
        return;
    }
    let min = min.and_then(Rank::parse);
    let max = max.and_then(Rank::parse).or(min);

    let mut a = min.map(|r| r.index()).unwrap_or(0);
    let mut b = max.map(|r| r.index()).unwrap_or(ALL_RANK_NAMES.len() - 1);
    if a > b {
        std::mem::swap(&mut a, &mut b);
    }

    let ranks: Vec<i64> = Rank::ALL[a..=b].iter().map(|r| *r as i64).collect();
    q.add_where(format!("names.rank IN ({})", id_set(&ranks)));
}

/// Misspelling inclusion for name queries.  Defaults to excluding
/// misspelled entries.
pub(crate) fn do_misspellings(q: &mut Query) {
    match q.params.get_str("misspellings").unwrap_or("no") {
        "no" => q.add_where("names.correct_spelling_id IS NULL"),
        "only" => q.add_where("names.correct_spelling_id IS NOT NULL"),
        _ => (),
    }
}

/// Deprecation filter for name queries.  Defaults to including both.
pub(crate) fn do_deprecated(q: &mut Query) {
    match q.params.get_str("deprecated").unwrap_or("either") {
        "no" => q.add_where("names.deprecated IS FALSE"),
        "only" => q.add_where("names.deprecated IS TRUE"),
        _ => (),
    }
}

/// Image size-class range filter.
pub(crate) fn do_image_size(q: &mut Query) {
    let (min, max) = q.params.get_str_pair("size");
    let min = min.map(str::to_string);
    let max = max.map(str::to_string);
    if let Some(min) = min {
        if let Some(i) = IMAGE_SIZES.iter().position(|s| *s == min) {
            let px = IMAGE_SIZE_PIXELS[i];
            q.add_where(format!("images.width >= {px} OR images.height >= {px}"));
        }
    }
    if let Some(max) = max {
        if let Some(i) = IMAGE_SIZES.iter().position(|s| *s == max) {
            let px = IMAGE_SIZE_PIXELS[i + 1];
            if px < i64::MAX {
                q.add_where(format!("images.width < {px} AND images.height < {px}"));
            }
        }
    }
}

/// Image file-format filter.  "raw" matches any content type outside the
/// known set.
pub(crate) fn do_image_types(q: &mut Query) {
    let val = match q.params.get_str("content_types") {
        Some(v) => strip_squeeze(v),
        None => return,
    };

    let mut mimes = Vec::new();
    let mut raw = false;
    for word in val.split(' ') {
        if word == "raw" {
            raw = true;
        } else if let Some(i) = IMAGE_EXTENSIONS.iter().position(|e| *e == word) {
            mimes.push(IMAGE_CONTENT_TYPES[i].to_string());
        }
    }
    if mimes.is_empty() && !raw {
        return;
    }

    let all_marks: Vec<&str> = IMAGE_CONTENT_TYPES.iter().map(|_| "?").collect();
    let known_set = format!("images.content_type NOT IN ({})", all_marks.join(","));
    let all_binds: Vec<String> = IMAGE_CONTENT_TYPES.iter().map(|s| s.to_string()).collect();

    if mimes.is_empty() {
        q.add_where_binds(known_set, all_binds);
    } else {
        let marks: Vec<&str> = mimes.iter().map(|_| "?").collect();
        let in_set = format!("images.content_type IN ({})", marks.join(","));
        if raw {
            let mut binds = mimes;
            binds.extend(all_binds);
            q.add_where_binds(format!("{in_set} OR {known_set}"), binds);
        } else {
            q.add_where_binds(in_set, mimes);
        }
    }
}

/// License filter: plain id equality.
pub(crate) fn do_license(q: &mut Query) {
    if let Some(id) = q.params.get_int("license") {
        let col = qualify(q, "license_id");
        q.add_where(format!("{col} = {id}"));
    }
}

/// Bounding-box filter.  Two variants: one against stored observation
/// coordinates, one against a location's box.  When the box crosses the
/// 180th meridian (west > east) the longitude test becomes a disjunction.
pub(crate) fn do_bounding_box(q: &mut Query, location_variant: bool) {
    let north = q.params.get_float("north");
    let south = q.params.get_float("south");
    let east = q.params.get_float("east");
    let west = q.params.get_float("west");

    let (n, s, e, w) = match (north, south, east, west) {
        (Some(n), Some(s), Some(e), Some(w)) => (n, s, e, w),
        _ => return,
    };

    let (obs_cond, loc_cond) = if w < e {
        (
            format!(
                "observations.lat >= {s} AND observations.lat <= {n} AND \
                 observations.long >= {w} AND observations.long <= {e}"
            ),
            format!(
                "locations.south >= {s} AND locations.north <= {n} AND \
                 locations.west >= {w} AND locations.east <= {e} AND \
                 locations.west <= locations.east"
            ),
        )
    } else {
        (
            format!(
                "observations.lat >= {s} AND observations.lat <= {n} AND \
                 (observations.long >= {w} OR observations.long <= {e})"
            ),
            format!(
                "locations.south >= {s} AND locations.north <= {n} AND \
                 locations.west >= {w} AND locations.east <= {e} AND \
                 locations.west > locations.east"
            ),
        )
    };

    if location_variant {
        for cond in loc_cond.split(" AND ") {
            q.add_where(cond.to_string());
        }
        return;
    }

    // Observations with plausible coordinates for their linked location are
    // matched on those coordinates; the rest fall back to the location box.
    // "Plausible" expands the box by 20% on each side, with the +/-72
    // degree correction when the box spans the 180th meridian.
    let plausible = "observations.lat >= locations.south * 1.2 - locations.north * 0.2 AND \
         observations.lat <= locations.north * 1.2 - locations.south * 0.2 AND \
         CASE WHEN locations.west <= locations.east THEN \
         observations.long >= locations.west * 1.2 - locations.east * 0.2 AND \
         observations.long <= locations.east * 1.2 - locations.west * 0.2 \
         ELSE \
         observations.long >= locations.west * 0.8 + locations.east * 0.2 + 72 OR \
         observations.long <= locations.east * 0.8 + locations.west * 0.2 - 72 END";

    if !q.uses_join("locations") {
        q.add_join(&["locations!"]);
    }
    q.add_where(format!(
        "CASE WHEN locations.id IS NULL OR ({plausible}) THEN ({obs_cond}) \
         ELSE ({loc_cond}) END"
    ));
}

/// Observation sub-filters shared by every observation query and every
/// query coerced from one.  The tag filters are accepted but generate no
/// predicate; there is no triple store to join against.
pub(crate) fn observation_filters(q: &mut Query) {
    do_boolean(
        q,
        "has_specimen",
        "observations.specimen IS TRUE",
        "observations.specimen IS FALSE",
    );
    do_boolean(
        q,
        "has_images",
        "observations.thumb_image_id IS NOT NULL",
        "observations.thumb_image_id IS NULL",
    );
}

/// Description source-type filter used by name queries.
pub(crate) fn do_desc_type(q: &mut Query) {
    do_enum_set_int(q, "desc_type", "name_descriptions.source_type", DESC_SOURCE_TYPES);
}
