use serde::Serialize;

/// Material kind. Supplementary items never gate course completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Main,
    Supplement,
}

/// One entry of the on-page course-material list, in list order.
/// Recomputed on every scrape; there is no stable identifier to cache by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseItem {
    pub title: String,
    pub passed: bool,
    pub kind: ItemKind,
}

/// Position of the first mandatory item that has not been passed yet,
/// scanning in list order. `None` means every mandatory item is done.
pub fn find_next_index(items: &[CourseItem]) -> Option<usize> {
    items
        .iter()
        .position(|item| item.kind == ItemKind::Main && !item.passed)
}

/// A lesson video location: `/courses/{course}/chapters/{chapter}/movie`.
/// Identifiers are opaque; only the path shape matters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPath {
    pub course: String,
    pub chapter: String,
}

impl LessonPath {
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments = path.split('/');
        if segments.next() != Some("") {
            return None;
        }
        let (courses, course, chapters, chapter, movie) = (
            segments.next()?,
            segments.next()?,
            segments.next()?,
            segments.next()?,
            segments.next()?,
        );
        if courses != "courses" || chapters != "chapters" || movie != "movie" {
            return None;
        }
        if course.is_empty() || chapter.is_empty() {
            return None;
        }
        // Tolerate a single trailing slash, nothing more.
        match segments.next() {
            None => {}
            Some("") => {
                if segments.next().is_some() {
                    return None;
                }
            }
            Some(_) => return None,
        }
        Some(Self {
            course: course.to_string(),
            chapter: chapter.to_string(),
        })
    }

    pub fn is_lesson_path(path: &str) -> bool {
        Self::parse(path).is_some()
    }

    /// Chapter overview path, the completion redirect target.
    pub fn chapter_path(&self) -> String {
        format!("/courses/{}/chapters/{}", self.course, self.chapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(title: &str, passed: bool, kind: ItemKind) -> CourseItem {
        CourseItem {
            title: title.to_string(),
            passed,
            kind,
        }
    }

    #[test]
    fn next_index_skips_passed_main_items() {
        let items = vec![
            item("1", true, ItemKind::Main),
            item("2", true, ItemKind::Main),
            item("3", true, ItemKind::Main),
            item("4", false, ItemKind::Main),
            item("extra", false, ItemKind::Supplement),
        ];

        assert_eq!(find_next_index(&items), Some(3));
    }

    #[test]
    fn next_index_ignores_pending_supplements() {
        let items = vec![
            item("1", true, ItemKind::Main),
            item("extra", false, ItemKind::Supplement),
            item("2", true, ItemKind::Main),
        ];

        assert_eq!(find_next_index(&items), None);
    }

    #[test]
    fn next_index_on_empty_list_is_none() {
        assert_eq!(find_next_index(&[]), None);
    }

    #[test]
    fn next_index_picks_lowest_pending_main() {
        let items = vec![
            item("1", false, ItemKind::Main),
            item("2", false, ItemKind::Main),
        ];

        assert_eq!(find_next_index(&items), Some(0));
    }

    #[test]
    fn parses_lesson_path() {
        let lesson = LessonPath::parse("/courses/abc123/chapters/xyz789/movie").unwrap();

        assert_eq!(lesson.course, "abc123");
        assert_eq!(lesson.chapter, "xyz789");
        assert_eq!(lesson.chapter_path(), "/courses/abc123/chapters/xyz789");
    }

    #[test]
    fn accepts_trailing_slash() {
        assert!(LessonPath::is_lesson_path("/courses/a/chapters/b/movie/"));
    }

    #[test]
    fn rejects_non_lesson_paths() {
        assert!(!LessonPath::is_lesson_path("/courses/a/chapters/b"));
        assert!(!LessonPath::is_lesson_path("/courses/a/chapters/b/exercise"));
        assert!(!LessonPath::is_lesson_path("/courses//chapters/b/movie"));
        assert!(!LessonPath::is_lesson_path("/prefix/courses/a/chapters/b/movie"));
        assert!(!LessonPath::is_lesson_path("/courses/a/chapters/b/movie/extra"));
        assert!(!LessonPath::is_lesson_path(""));
        assert!(!LessonPath::is_lesson_path("courses/a/chapters/b/movie"));
    }
}
