use std::io::Write;

use chrono_humanize::HumanTime;
use termion::color::AnsiValue;

use vibecoders::models::Post;
use vibecoders::url::Url;

use crate::app::FeedView;
use crate::error::Error;
use crate::text::Fancy;
use crate::theme::Theme;
use crate::util;

pub type Line = Vec<Fancy>;
pub type Lines = Vec<Line>;

/// Lay the feed out as two styled lines per post, windowed to the viewport
pub fn feed_lines(posts: &[Post], view: &FeedView, theme: &Theme, height: usize) -> Lines {
    let mut lines = Vec::new();

    // Pad every score to the widest one
    let digits = posts
        .iter()
        .map(|post| util::count_digits(post.score))
        .max()
        .unwrap_or(1);

    for (i, post) in posts.iter().enumerate() {
        let score_colour = if post.upvoted() {
            theme.upvoted
        } else {
            theme.score
        };
        let score = Fancy::new(format!("{:1$}", post.score, digits)).fg(score_colour);
        let title = Fancy::new(format!(" {}", post.title)).fg(theme.title).bold();
        let domain = Fancy::new(
            post_domain(post)
                .map(|domain| format!(" {}", domain))
                .unwrap_or_default(),
        )
        .fg(theme.domain)
        .italic();

        let byline = format!(
            "{:pad$} via {author} {when} | {n} comments",
            " ",
            pad = digits,
            author = post.author().unwrap_or("unknown"),
            when = HumanTime::from(post.created_at),
            n = post.comments.len(),
        );

        let mut line1: Line = vec![score, title, domain];
        let mut line2: Line = vec![Fancy::new(byline).fg(theme.byline)];

        if i == view.cursor() {
            line1 = highlight_line(line1, theme.cursor);
            line2 = highlight_line(line2, theme.cursor);
        }

        lines.push(line1);
        lines.push(line2);
    }

    lines
        .into_iter()
        .skip(view.row_offset())
        .take(height)
        .collect()
}

/// Lay a post detail out as styled lines: header, body, then its comments
pub fn detail_lines(post: &Post, theme: &Theme) -> Lines {
    let mut lines = Vec::new();

    let score = Fancy::new(post.score.to_string()).fg(if post.upvoted() {
        theme.upvoted
    } else {
        theme.score
    });
    let title = Fancy::new(format!(" {}", post.title)).fg(theme.title).bold();
    let domain = Fancy::new(
        post_domain(post)
            .map(|domain| format!(" {}", domain))
            .unwrap_or_default(),
    )
    .fg(theme.domain)
    .italic();
    lines.push(vec![score, title, domain]);

    let byline = format!(
        "via {} {}",
        post.author().unwrap_or("unknown"),
        HumanTime::from(post.created_at),
    );
    lines.push(vec![Fancy::new(byline).fg(theme.byline)]);

    if !post.content.is_empty() {
        lines.push(Vec::new());
        for text_line in post.content.lines() {
            lines.push(vec![Fancy::new(text_line)]);
        }
    }

    lines.push(Vec::new());
    if post.comments.is_empty() {
        lines.push(vec![Fancy::new("no comments yet").fg(theme.byline)]);
    } else {
        for comment in &post.comments {
            lines.push(vec![
                Fancy::new(comment.author().unwrap_or("unknown"))
                    .fg(theme.title)
                    .bold(),
                Fancy::new(format!(" {}", HumanTime::from(comment.created_at)))
                    .fg(theme.byline),
            ]);
            for text_line in comment.content.lines() {
                lines.push(vec![Fancy::new(format!("  {}", text_line))]);
            }
        }
    }

    lines
}

/// Domain of the post's external link, if it has one that parses
fn post_domain(post: &Post) -> Option<String> {
    if post.url.is_empty() {
        return None;
    }
    post.url
        .parse::<Url>()
        .ok()
        .and_then(|url| url.domain().map(|domain| domain.to_string()))
}

fn highlight_line(line: Line, colour: AnsiValue) -> Line {
    line.into_iter().map(|span| span.bg(colour)).collect()
}

/// Paint the whole screen: the windowed feed lines plus a status line
pub fn draw<W: Write>(
    screen: &mut W,
    lines: &Lines,
    status: &str,
    theme: &Theme,
    width: usize,
    height: usize,
) -> Result<(), Error> {
    write!(screen, "{}{}", termion::cursor::Goto(1, 1), termion::clear::All)?;

    for (row, line) in lines.iter().enumerate() {
        if row != 0 {
            write!(screen, "\r\n")?;
        }

        let mut col = 0;
        for span in line {
            if col >= width {
                break;
            }
            let span_cols = span.cols();
            if col + span_cols <= width {
                write!(screen, "{}", span)?;
                col += span_cols;
            } else {
                write!(screen, "{}", span.truncate(width - col))?;
                col = width;
            }
        }

        // Extend the cursor bar across the rest of the row
        if col < width {
            if let Some(bg) = line.last().and_then(Fancy::get_bg) {
                let blank: String = " ".repeat(width - col);
                write!(screen, "{}", Fancy::new(blank).bg(bg))?;
            }
        }
    }

    if height > 0 {
        let status = Fancy::new(status.chars().take(width).collect::<String>()).fg(theme.status);
        write!(
            screen,
            "{}{}{}",
            termion::cursor::Goto(1, height as u16),
            termion::clear::CurrentLine,
            status
        )?;
    }

    screen.flush().map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::VIBE_256;
    use chrono::{TimeZone, Utc};
    use vibecoders::models::Comment;

    fn post(id: i64) -> Post {
        Post {
            id,
            user_id: 1,
            title: format!("post {}", id),
            content: String::new(),
            url: String::new(),
            score: 3,
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap(),
            user: None,
            comments: Vec::new(),
            vote_status: None,
        }
    }

    fn rendered(lines: &Lines) -> String {
        lines
            .iter()
            .flat_map(|line| line.iter())
            .map(|span| span.to_string())
            .collect()
    }

    #[test]
    fn detail_includes_body_and_comments() {
        let mut detail = post(5);
        detail.content = "like this".to_string();
        detail.comments = vec![Comment {
            id: 9,
            post_id: 5,
            user_id: 4,
            content: "nice".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 3, 10, 13, 0, 0).unwrap(),
            user: None,
        }];

        let text = rendered(&detail_lines(&detail, &VIBE_256));
        assert!(text.contains("post 5"));
        assert!(text.contains("like this"));
        assert!(text.contains("nice"));
    }

    #[test]
    fn detail_without_comments_says_so() {
        let text = rendered(&detail_lines(&post(5), &VIBE_256));
        assert!(text.contains("no comments yet"));
    }

    #[test]
    fn feed_windows_rows_to_the_viewport() {
        let posts: Vec<Post> = (1..=10).map(post).collect();
        let view = FeedView::new();

        let lines = feed_lines(&posts, &view, &VIBE_256, 6);
        assert_eq!(lines.len(), 6);
    }
}
