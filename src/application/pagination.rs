use crate::domain::entities::bill::BillDocument;
use crate::domain::error::DomainError;
use crate::domain::ports::bill_repository::DocumentSource;
use tracing::debug;

pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Read every document from `source`, starting at `start_offset`, one page at a
/// time until a page comes back shorter than `page_size`.
pub fn fetch_all<S: DocumentSource + ?Sized>(
    source: &S,
    page_size: usize,
    start_offset: usize,
) -> Result<Vec<BillDocument>, DomainError> {
    if page_size == 0 {
        return Err(DomainError::InvalidInput("page size must be positive".into()));
    }

    let mut all = Vec::new();
    let mut offset = start_offset;
    loop {
        let page = source.fetch_page(page_size, offset)?;
        let len = page.len();
        all.extend(page);
        debug!(offset, fetched = len, total = all.len(), "Fetched page");
        if len < page_size {
            break;
        }
        offset += page_size;
    }
    Ok(all)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct SizedPages {
        sizes: Vec<usize>,
        calls: Mutex<Vec<(usize, usize)>>,
    }

    impl DocumentSource for SizedPages {
        fn fetch_page(&self, limit: usize, offset: usize) -> Result<Vec<BillDocument>, DomainError> {
            let mut calls = self.calls.lock().unwrap();
            let n = self.sizes.get(calls.len()).copied().unwrap_or(0);
            calls.push((limit, offset));
            Ok((0..n)
                .map(|i| BillDocument::new(format!("b{}", offset + i), "t"))
                .collect())
        }
    }

    #[test]
    fn test_stops_after_short_page() {
        let src = SizedPages {
            sizes: vec![1000, 1000, 3],
            calls: Mutex::new(vec![]),
        };
        let docs = fetch_all(&src, 1000, 0).unwrap();
        assert_eq!(docs.len(), 2003);
        assert_eq!(
            *src.calls.lock().unwrap(),
            vec![(1000, 0), (1000, 1000), (1000, 2000)]
        );
    }

    #[test]
    fn test_exact_multiple_needs_one_empty_page() {
        let src = SizedPages {
            sizes: vec![2, 2],
            calls: Mutex::new(vec![]),
        };
        let docs = fetch_all(&src, 2, 0).unwrap();
        assert_eq!(docs.len(), 4);
        assert_eq!(src.calls.lock().unwrap().len(), 3);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let src = SizedPages {
            sizes: vec![],
            calls: Mutex::new(vec![]),
        };
        assert!(matches!(fetch_all(&src, 0, 0), Err(DomainError::InvalidInput(_))));
    }
}
