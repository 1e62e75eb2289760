/// How a page of results is requested.
///
/// Page numbers are zero-based and `$top` on its own already returns page 0, so every other
/// page is one further than its number suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// `top` was 0, the server picks the page size.
    Unbounded,
    First { top: u32 },
    Offset { top: u32, skip: u64 },
    /// Server-side paging cookie, paired with a `Prefer: odata.maxpagesize` header.
    SkipToken { top: u32, page_number: u64 },
}

impl Paging {
    pub fn new(top: u32, page: u32, use_skip_tokens: bool) -> Self {
        if top == 0 {
            return Paging::Unbounded;
        }

        if page == 0 {
            return Paging::First { top };
        }

        let next_page = u64::from(page) + 1;

        if use_skip_tokens {
            Paging::SkipToken {
                top,
                page_number: next_page,
            }
        } else {
            Paging::Offset {
                top,
                skip: next_page * u64::from(top),
            }
        }
    }

    pub fn query_parts(&self) -> Vec<String> {
        match *self {
            Paging::Unbounded => Vec::new(),
            Paging::First { top } => vec![format!("$top={top}")],
            Paging::Offset { top, skip } => vec![format!("$top={top}"), format!("$skip={skip}")],
            Paging::SkipToken { top, page_number } => vec![
                format!("$top={top}"),
                format!("$skiptoken=<cookie pagenumber='{page_number}' />"),
            ],
        }
    }

    pub fn prefer_header(&self) -> Option<(&'static str, String)> {
        match *self {
            Paging::SkipToken { top, .. } => Some(("Prefer", format!("odata.maxpagesize={top}"))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        assert_eq!(Paging::new(0, 3, false), Paging::Unbounded);
        assert_eq!(Paging::new(50, 0, true), Paging::First { top: 50 });
        assert_eq!(Paging::new(50, 2, false), Paging::Offset { top: 50, skip: 150 });
        assert_eq!(
            Paging::new(50, 2, true),
            Paging::SkipToken {
                top: 50,
                page_number: 3
            }
        );
    }

    #[test]
    fn test_large_pages_do_not_overflow() {
        assert_eq!(
            Paging::new(u32::MAX, u32::MAX, false),
            Paging::Offset {
                top: u32::MAX,
                skip: (u64::from(u32::MAX) + 1) * u64::from(u32::MAX),
            }
        );
    }

    #[test]
    fn test_rendering() {
        let paging = Paging::new(10, 1, true);

        assert_eq!(
            paging.query_parts(),
            vec!["$top=10", "$skiptoken=<cookie pagenumber='2' />"]
        );
        assert_eq!(
            paging.prefer_header(),
            Some(("Prefer", "odata.maxpagesize=10".to_string()))
        );
        assert_eq!(Paging::new(10, 1, false).prefer_header(), None);
    }
}
