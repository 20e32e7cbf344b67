//! Fixed demo content.

pub struct DemoUser {
    pub username: &'static str,
    pub password: &'static str,
    pub first_name: &'static str,
    pub last_name: &'static str,
    pub is_superuser: bool,
}

pub struct DemoCategory {
    pub slug: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub struct DemoPost {
    pub title: &'static str,
    pub text: &'static str,
    pub article_url: Option<&'static str>,
    pub image_url: Option<&'static str>,
    pub category: &'static str,
    pub location: &'static str,
    pub author: &'static str,
    /// Negative values schedule the post in the future.
    pub days_ago: i64,
    pub is_published: bool,
}

pub const USERS: &[DemoUser] = &[
    DemoUser {
        username: "admin",
        password: "admin12345",
        first_name: "Marina",
        last_name: "Administrator",
        is_superuser: true,
    },
    DemoUser {
        username: "marta",
        password: "marta12345",
        first_name: "Marta",
        last_name: "Lebedeva",
        is_superuser: false,
    },
    DemoUser {
        username: "maksim",
        password: "maksim12345",
        first_name: "Maksim",
        last_name: "Orlov",
        is_superuser: false,
    },
    DemoUser {
        username: "olga",
        password: "olga12345",
        first_name: "Olga",
        last_name: "Smirnova",
        is_superuser: false,
    },
];

/// Authors of the three comments left on each commented post, in order.
pub const COMMENTERS: [&str; 3] = ["marta", "maksim", "olga"];

/// Only the first posts get comments.
pub const COMMENTED_POSTS: usize = 7;

pub const CATEGORIES: &[DemoCategory] = &[
    DemoCategory {
        slug: "frontend",
        title: "Frontend",
        description: "Interfaces, forms and UX practice.",
    },
    DemoCategory {
        slug: "ai-ml",
        title: "AI & ML",
        description: "Machine learning news and practice.",
    },
    DemoCategory {
        slug: "gadgets",
        title: "Gadgets",
        description: "Devices and the everyday problems they solve.",
    },
    DemoCategory {
        slug: "career",
        title: "Career",
        description: "Working in IT, growing skills and teams.",
    },
];

pub const LOCATIONS: &[&str] = &[
    "Moscow",
    "Saint Petersburg",
    "Kazan",
    "Yekaterinburg",
    "Novosibirsk",
];

pub const POSTS: &[DemoPost] = &[
    DemoPost {
        title: "Cloud.ru: choosing a form architecture in React and Angular",
        text: "Once a form grows to dozens of fields, the hard part is no longer \
               buttons and inputs but logic. Keep domain rules apart from the UI: \
               business checks, value conversion and error handling belong outside \
               the markup, so new fields land quickly and one scenario does not \
               break the others.",
        article_url: Some("https://habr.com/ru/companies/cloud_x/articles/1004508/"),
        image_url: Some(
            "https://habrastorage.org/getpro/habr/upload_files/b3f/905/eba/b3f905eba7520e054de04ea90494997e.jpg",
        ),
        category: "frontend",
        location: "Moscow",
        author: "maksim",
        days_ago: 1,
        is_published: true,
    },
    DemoPost {
        title: "Selectel: a noise-free ML digest of the week",
        text: "This week was about practical AI agents, inference cost and \
               pipeline security. Look beyond answer quality at latency, price per \
               request and predictability in production. Without monitoring and \
               access limits even a strong model quickly becomes a business risk.",
        article_url: Some("https://habr.com/ru/companies/selectel/articles/1004450/"),
        image_url: Some(
            "https://habrastorage.org/getpro/habr/upload_files/800/16a/ba2/80016aba2c88061ed9c923a284ccf3d5.jpeg",
        ),
        category: "ai-ml",
        location: "Saint Petersburg",
        author: "olga",
        days_ago: 2,
        is_published: true,
    },
    DemoPost {
        title: "Samsung: what modern smartwatches can do",
        text: "Smartwatches have outgrown step counting and notifications. Their \
               value now is the combination of sensors that estimates sleep, load \
               and recovery from indirect metrics. Wrist data does not replace a \
               medical diagnosis: trends help everyday decisions, conclusions need \
               context.",
        article_url: Some("https://habr.com/ru/companies/samsung/articles/1004510/"),
        image_url: Some(
            "https://habrastorage.org/getpro/habr/upload_files/a59/2ef/1f9/a592ef1f951dd64df97cc77a3ec9abea.png",
        ),
        category: "gadgets",
        location: "Kazan",
        author: "marta",
        days_ago: 3,
        is_published: true,
    },
    DemoPost {
        title: "Running a code review without toxicity",
        text: "A good review is about lowering risk, not finding someone to blame. \
               Check behaviour and regressions first, style second, and always \
               explain the reason behind a remark.",
        article_url: None,
        image_url: None,
        category: "career",
        location: "Yekaterinburg",
        author: "marta",
        days_ago: 4,
        is_published: true,
    },
    DemoPost {
        title: "Five pagination mistakes users hate",
        text: "The usual suspects: no first or last page link, filters lost from \
               the URL, and no idea how many pages there are. The fix takes an hour \
               and the UX payoff is huge.",
        article_url: None,
        image_url: None,
        category: "frontend",
        location: "Novosibirsk",
        author: "maksim",
        days_ago: 5,
        is_published: true,
    },
    DemoPost {
        title: "A sane comment schema: what to decide up front",
        text: "Think through the post, author and created_at links early and \
               editing or deleting comments becomes easy. The hard part is usually \
               permissions, not CRUD.",
        article_url: None,
        image_url: None,
        category: "ai-ml",
        location: "Moscow",
        author: "olga",
        days_ago: 6,
        is_published: true,
    },
    DemoPost {
        title: "A scheduled post for checking publish dates",
        text: "Other users will see this post once its publish date arrives; its \
               author sees it on their profile right away.",
        article_url: None,
        image_url: None,
        category: "career",
        location: "Saint Petersburg",
        author: "maksim",
        days_ago: -1,
        is_published: true,
    },
    DemoPost {
        title: "A hidden post for checking access rights",
        text: "This post is unpublished and must be visible to its author only.",
        article_url: None,
        image_url: None,
        category: "frontend",
        location: "Kazan",
        author: "marta",
        days_ago: 7,
        is_published: false,
    },
];

pub fn comment_text(commenter: &str, post_number: usize) -> String {
    match commenter {
        "marta" => format!(
            "Thanks for post #{post_number}. I liked that the conclusions apply in practice."
        ),
        "maksim" => format!(
            "Post #{post_number} could use more product examples, but it is well argued."
        ),
        _ => format!("A question on post #{post_number}: how does this scale to a team of 10+?"),
    }
}
