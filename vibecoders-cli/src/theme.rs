use termion::color::AnsiValue;

/// Colours for the feed browser and the table printers
pub struct Theme {
    pub score: AnsiValue,
    pub upvoted: AnsiValue,
    pub title: AnsiValue,
    pub domain: AnsiValue,
    pub byline: AnsiValue,
    pub cursor: AnsiValue,
    pub status: AnsiValue,
    pub positive: AnsiValue,
    pub negative: AnsiValue,
}

/// Default purple-ish palette, close to the site's own
pub static VIBE_256: Theme = Theme {
    score: AnsiValue(248),
    upvoted: AnsiValue(141),
    title: AnsiValue(105),
    domain: AnsiValue(245),
    byline: AnsiValue(250),
    cursor: AnsiValue(237),
    status: AnsiValue(252),
    positive: AnsiValue(114),
    negative: AnsiValue(174),
};

/// Greyscale palette for terminals where colours are unwelcome
pub static VIBE_GREY: Theme = Theme {
    score: AnsiValue(245),
    upvoted: AnsiValue(255),
    title: AnsiValue(253),
    domain: AnsiValue(243),
    byline: AnsiValue(248),
    cursor: AnsiValue(236),
    status: AnsiValue(250),
    positive: AnsiValue(252),
    negative: AnsiValue(244),
};
