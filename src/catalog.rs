//! Article catalog: a fixed list of articles with filter, search and sort
//! queries. Queries never reorder or mutate the backing list.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Category value meaning "no filtering".
pub const ALL_CATEGORIES: &str = "all";

pub const DEFAULT_RECENT_LIMIT: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: u32,
    pub title: String,
    pub excerpt: String,
    pub category: String,
    pub author: String,
    pub date: NaiveDate,
    pub image: String,
    pub featured: bool,
}

#[derive(Debug, Clone)]
pub struct Catalog {
    articles: Vec<Article>,
}

impl Catalog {
    pub fn new(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    /// The articles shipped with the site.
    pub fn sample() -> Self {
        Self::new(
            SAMPLE_ARTICLES
                .iter()
                .map(|s| Article {
                    id: s.id,
                    title: s.title.to_string(),
                    excerpt: s.excerpt.to_string(),
                    category: s.category.to_string(),
                    author: s.author.to_string(),
                    date: NaiveDate::from_ymd_opt(s.date.0, s.date.1, s.date.2)
                        .unwrap_or(NaiveDate::MIN),
                    image: s.image.to_string(),
                    featured: s.featured,
                })
                .collect(),
        )
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Exact, case-sensitive category match; `"all"` returns everything.
    pub fn filter_by_category(&self, category: &str) -> Vec<&Article> {
        if category == ALL_CATEGORIES {
            return self.articles.iter().collect();
        }
        self.articles
            .iter()
            .filter(|a| a.category == category)
            .collect()
    }

    /// Case-insensitive substring match on title, excerpt or category.
    pub fn search(&self, query: &str) -> Vec<&Article> {
        let query = query.to_lowercase();
        self.articles
            .iter()
            .filter(|a| {
                a.title.to_lowercase().contains(&query)
                    || a.excerpt.to_lowercase().contains(&query)
                    || a.category.to_lowercase().contains(&query)
            })
            .collect()
    }

    /// Look up by id given as text. Anything without a leading integer is
    /// simply not found.
    pub fn get_by_id(&self, id: &str) -> Option<&Article> {
        let id = parse_leading_int(id)?;
        self.articles.iter().find(|a| i64::from(a.id) == id)
    }

    pub fn get_featured(&self) -> Vec<&Article> {
        self.articles.iter().filter(|a| a.featured).collect()
    }

    /// Newest first, at most `limit`.
    pub fn get_recent(&self, limit: usize) -> Vec<&Article> {
        let mut recent: Vec<&Article> = self.articles.iter().collect();
        recent.sort_by(|a, b| b.date.cmp(&a.date));
        recent.truncate(limit);
        recent
    }

    /// Distinct categories in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for article in &self.articles {
            if !seen.contains(&article.category.as_str()) {
                seen.push(&article.category);
            }
        }
        seen
    }
}

/// Integer prefix of `s` after leading whitespace (`"3abc"` is 3).
fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// `Jan 28, 2026`
pub fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Text card for one article.
pub fn render_card(article: &Article) -> String {
    format!(
        "#{} [{}] {} ({})\n    {}\n    by {} - blog-details.html?id={}",
        article.id,
        article.category,
        article.title,
        format_date(article.date),
        article.excerpt,
        article.author,
        article.id
    )
}

pub fn render_list(articles: &[&Article]) -> String {
    if articles.is_empty() {
        return "No articles found.".to_string();
    }
    articles
        .iter()
        .map(|a| render_card(a))
        .collect::<Vec<_>>()
        .join("\n")
}

struct SampleArticle {
    id: u32,
    title: &'static str,
    excerpt: &'static str,
    category: &'static str,
    author: &'static str,
    date: (i32, u32, u32),
    image: &'static str,
    featured: bool,
}

const SAMPLE_ARTICLES: &[SampleArticle] = &[
    SampleArticle {
        id: 1,
        title: "The Art of Minimalist Design",
        excerpt: "Exploring the principles of minimalism in modern web design and how it enhances user experience.",
        category: "Design",
        author: "John Doe",
        date: (2026, 1, 28),
        image: "https://images.unsplash.com/photo-1507238691740-187a5b1d37b8?w=800",
        featured: true,
    },
    SampleArticle {
        id: 2,
        title: "Typography Trends for 2026",
        excerpt: "Discover the latest typography trends that are shaping the digital landscape this year.",
        category: "Typography",
        author: "Jane Smith",
        date: (2026, 1, 25),
        image: "https://images.unsplash.com/photo-1488190211105-8b0e65b80b4e?w=800",
        featured: false,
    },
    SampleArticle {
        id: 3,
        title: "Color Psychology in Branding",
        excerpt: "Understanding how colors influence consumer behavior and brand perception.",
        category: "Branding",
        author: "Mike Johnson",
        date: (2026, 1, 22),
        image: "https://images.unsplash.com/photo-1541701494587-cb58502866ab?w=800",
        featured: true,
    },
    SampleArticle {
        id: 4,
        title: "Responsive Design Best Practices",
        excerpt: "Essential techniques for creating websites that work seamlessly across all devices.",
        category: "Development",
        author: "Sarah Williams",
        date: (2026, 1, 20),
        image: "https://images.unsplash.com/photo-1498050108023-c5249f4df085?w=800",
        featured: false,
    },
    SampleArticle {
        id: 5,
        title: "The Future of Web Animations",
        excerpt: "How modern CSS and JavaScript are revolutionizing web animations and interactions.",
        category: "Development",
        author: "Tom Brown",
        date: (2026, 1, 18),
        image: "https://images.unsplash.com/photo-1517694712202-14dd9538aa97?w=800",
        featured: false,
    },
    SampleArticle {
        id: 6,
        title: "Building Accessible Websites",
        excerpt: "A comprehensive guide to making your website accessible to all users.",
        category: "Accessibility",
        author: "Emily Davis",
        date: (2026, 1, 15),
        image: "https://images.unsplash.com/photo-1516321318423-f06f85e504b3?w=800",
        featured: true,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(articles: &[&Article]) -> Vec<String> {
        articles.iter().map(|a| a.title.clone()).collect()
    }

    #[test]
    fn test_empty_search_matches_all() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.search("").len(), 6);
    }

    #[test]
    fn test_search_typography() {
        let catalog = Catalog::sample();
        let results = catalog.search("typography");
        assert_eq!(titles(&results), vec!["Typography Trends for 2026"]);
    }

    #[test]
    fn test_search_matches_excerpt_and_category() {
        let catalog = Catalog::sample();
        // "brand" appears in the Branding category and one excerpt
        let results = catalog.search("BRAND");
        assert_eq!(titles(&results), vec!["Color Psychology in Branding"]);
        // "development" only as a category
        assert_eq!(catalog.search("development").len(), 2);
    }

    #[test]
    fn test_filter_by_category() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.filter_by_category("all").len(), 6);

        let design = catalog.filter_by_category("Design");
        assert_eq!(titles(&design), vec!["The Art of Minimalist Design"]);

        assert!(catalog.filter_by_category("design").is_empty());
        assert!(catalog.filter_by_category("All").is_empty());
    }

    #[test]
    fn test_get_by_id() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.get_by_id("3").unwrap().title, "Color Psychology in Branding");
        assert_eq!(catalog.get_by_id(" 4").unwrap().id, 4);
        assert_eq!(catalog.get_by_id("5abc").unwrap().id, 5);
        assert!(catalog.get_by_id("abc").is_none());
        assert!(catalog.get_by_id("").is_none());
        assert!(catalog.get_by_id("-1").is_none());
        assert!(catalog.get_by_id("99").is_none());
    }

    #[test]
    fn test_get_featured() {
        let catalog = Catalog::sample();
        let ids: Vec<u32> = catalog.get_featured().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 3, 6]);
    }

    #[test]
    fn test_get_recent_sorts_copy() {
        let catalog = Catalog::new(
            Catalog::sample()
                .articles()
                .iter()
                .rev()
                .cloned()
                .collect(),
        );
        let recent = catalog.get_recent(3);
        let dates: Vec<String> = recent.iter().map(|a| a.date.to_string()).collect();
        assert_eq!(dates, vec!["2026-01-28", "2026-01-25", "2026-01-22"]);

        // Backing order untouched, repeated calls agree
        assert_eq!(catalog.articles()[0].id, 6);
        assert_eq!(catalog.get_recent(3), recent);
    }

    #[test]
    fn test_get_recent_limit_larger_than_catalog() {
        let catalog = Catalog::sample();
        assert_eq!(catalog.get_recent(50).len(), 6);
        assert!(catalog.get_recent(0).is_empty());
    }

    #[test]
    fn test_categories_distinct() {
        let catalog = Catalog::sample();
        assert_eq!(
            catalog.categories(),
            vec!["Design", "Typography", "Branding", "Development", "Accessibility"]
        );
    }

    #[test]
    fn test_format_date() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 8).unwrap();
        assert_eq!(format_date(date), "Jan 8, 2026");
    }

    #[test]
    fn test_render_list_empty() {
        assert_eq!(render_list(&[]), "No articles found.");
    }
}
