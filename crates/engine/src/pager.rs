use serde::Serialize;

/// One slice of a collection. Boundaries depend only on input order and page size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<'a, T> {
    pub index: usize,
    /// `"<start>-<end>"` with 1-based inclusive indices, `"0"` for an empty collection.
    pub label: String,
    /// Collection root for the first page, `<root><start>-<end>/` after that.
    pub path: String,
    pub items: &'a [T],
}

/// Navigation link to a page, marked when it is the page being rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub label: String,
    pub path: String,
    pub is_current: bool,
}

/// Split `items` into pages of `page_size` under `root` (e.g. `/event/`).
///
/// Always yields at least one page. A zero page size is treated as one.
pub fn paginate<'a, T>(items: &'a [T], page_size: usize, root: &str) -> Vec<Page<'a, T>> {
    if items.is_empty() {
        return vec![Page { index: 0, label: "0".to_string(), path: root.to_string(), items }];
    }

    items
        .chunks(page_size.max(1))
        .enumerate()
        .map(|(index, chunk)| {
            let start = index * page_size.max(1) + 1;
            let end = start + chunk.len() - 1;
            let label = format!("{start}-{end}");
            let path = if index == 0 {
                root.to_string()
            } else {
                format!("{root}{label}/")
            };
            Page { index, label, path, items: chunk }
        })
        .collect()
}

/// Number of pages `paginate` yields for `len` items.
pub fn page_count(len: usize, page_size: usize) -> usize {
    len.div_ceil(page_size.max(1)).max(1)
}

/// Links to every page, with `current` marked. Computed per rendered page.
pub fn page_links<T>(pages: &[Page<'_, T>], current: usize) -> Vec<PageLink> {
    pages
        .iter()
        .map(|p| PageLink {
            label: p.label.clone(),
            path: p.path.clone(),
            is_current: p.index == current,
        })
        .collect()
}

/// First/last/prev/next ids around one record, in fetch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordNav {
    pub first_id: i64,
    pub last_id: i64,
    pub prev_id: Option<i64>,
    pub next_id: Option<i64>,
}

/// Navigation for position `index` in `ids`. `None` when out of range.
pub fn record_nav(ids: &[i64], index: usize) -> Option<RecordNav> {
    if index >= ids.len() {
        return None;
    }
    Some(RecordNav {
        first_id: ids[0],
        last_id: ids[ids.len() - 1],
        prev_id: index.checked_sub(1).map(|i| ids[i]),
        next_id: ids.get(index + 1).copied(),
    })
}
