use blog_client::{BlogClient, NewPost, PostPage, SearchQuery};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(about = "Command line client for the blog API")]
struct Cli {
    #[clap(short, long, env = "BLOG_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    Register {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
        #[clap(long)]
        name: String,
    },
    Login {
        #[clap(long)]
        email: String,
        #[clap(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Published posts, newest first
    List {
        #[clap(long)]
        page: Option<u32>,
        #[clap(long)]
        limit: Option<u32>,
    },
    /// All posts including drafts (admin)
    Drafts {
        #[clap(long)]
        page: Option<u32>,
        #[clap(long)]
        limit: Option<u32>,
    },
    Search {
        query: Option<String>,
        #[clap(long)]
        category: Option<String>,
        #[clap(long)]
        tag: Option<String>,
        #[clap(long)]
        page: Option<u32>,
        #[clap(long)]
        limit: Option<u32>,
    },
    Get {
        slug: String,
    },
    Create {
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
        #[clap(long)]
        excerpt: Option<String>,
        #[clap(long = "category")]
        categories: Vec<String>,
        #[clap(long = "tag")]
        tags: Vec<String>,
        #[clap(long)]
        draft: bool,
        #[clap(long)]
        featured_image: Option<String>,
    },
    Update {
        slug: String,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        content: Option<String>,
    },
    Delete {
        slug: String,
    },
    Upload {
        path: PathBuf,
    },
}

fn print_page(page: &PostPage) {
    let info = &page.pagination;
    println!(
        "Posts: page {} of {} ({} total)",
        info.page,
        info.pages.max(1),
        info.total
    );
    for post in &page.posts {
        let state = if post.published { "" } else { " [draft]" };
        println!("- {} ({}){}", post.title, post.slug, state);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();
    let mut client = BlogClient::connect(&args.server).await?;

    match args.command {
        Command::Register {
            email,
            password,
            name,
        } => {
            let user = client.register(&email, &password, &name).await?;
            println!("Registered {} <{}> as {}", user.name, user.email, user.role);
        }
        Command::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            println!("Logged in as {}", user.name);
        }
        Command::Logout => {
            client.logout().await?;
            println!("Logged out");
        }
        Command::Whoami => {
            let user = client.me().await?;
            println!("{} <{}> ({})", user.name, user.email, user.role);
        }
        Command::List { page, limit } => {
            print_page(&client.list_posts(page, limit).await?);
        }
        Command::Drafts { page, limit } => {
            print_page(&client.admin_posts(page, limit).await?);
        }
        Command::Search {
            query,
            category,
            tag,
            page,
            limit,
        } => {
            let query = SearchQuery {
                q: query,
                category,
                tag,
                page,
                limit,
            };
            print_page(&client.search(&query).await?);
        }
        Command::Get { slug } => {
            println!("{}", client.get_post(&slug).await?);
        }
        Command::Create {
            title,
            content,
            excerpt,
            categories,
            tags,
            draft,
            featured_image,
        } => {
            let post = client
                .create_post(&NewPost {
                    title,
                    content,
                    excerpt,
                    categories,
                    tags,
                    published: Some(!draft),
                    featured_image,
                })
                .await?;
            println!("Post created: {}", post.slug);
        }
        Command::Update {
            slug,
            title,
            content,
        } => {
            // the API replaces both fields, so fill the missing one from the current post
            let (title, content) = match (title, content) {
                (Some(t), Some(c)) => (t, c),
                (t, c) => {
                    let current = client.get_post(&slug).await?;
                    (t.unwrap_or(current.title), c.unwrap_or(current.content))
                }
            };
            let post = client.update_post(&slug, &title, &content).await?;
            println!("Post updated: {}", post.slug);
        }
        Command::Delete { slug } => {
            client.delete_post(&slug).await?;
            println!("Post deleted!");
        }
        Command::Upload { path } => {
            let file = client.upload(&path).await?;
            println!("Uploaded {} -> {}", file.filename, file.url);
        }
    }

    Ok(())
}
