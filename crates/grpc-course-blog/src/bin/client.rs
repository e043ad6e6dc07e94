//! Blog client binary: CRUD subcommands plus the server-streaming list.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use grpc_course_core::duplex::drain;
use grpc_course_core::proto::blog::{
    Blog, CreateBlogRequest, DeleteBlogRequest, ListBlogRequest, ReadBlogRequest,
    UpdateBlogRequest, blog_service_client::BlogServiceClient,
};
use tonic::Code;

#[derive(Parser, Debug)]
#[command(name = "blog-client", about = "Blog demo gRPC client")]
struct CliArgs {
    /// Server URL.
    #[arg(long, env = "BLOG_SERVER_URL", default_value = "http://localhost:50053")]
    url: String,

    #[command(subcommand)]
    demo: Demo,
}

#[derive(Subcommand, Debug)]
enum Demo {
    /// Create a blog and print the assigned id.
    Create {
        #[arg(long, default_value = "author-1")]
        author: String,
        #[arg(long, default_value = "My first blog")]
        title: String,
        #[arg(long, default_value = "Content of the first blog")]
        content: String,
    },
    /// Read a blog by id; malformed and absent ids print their distinct
    /// status codes.
    Read { id: String },
    /// Update a blog's fields by id.
    Update {
        id: String,
        #[arg(long, default_value = "changed-author")]
        author: String,
        #[arg(long, default_value = "Edited title")]
        title: String,
        #[arg(long, default_value = "Edited content")]
        content: String,
    },
    /// Delete a blog by id.
    Delete { id: String },
    /// List every blog over the server stream.
    List,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut client = BlogServiceClient::connect(args.url.clone())
        .await
        .with_context(|| format!("could not connect to `{}`", args.url))?;

    match args.demo {
        Demo::Create {
            author,
            title,
            content,
        } => {
            let res = client
                .create_blog(CreateBlogRequest {
                    blog: Some(Blog {
                        id: String::new(),
                        author_id: author,
                        title,
                        content,
                    }),
                })
                .await?;
            let blog = res.into_inner().blog.unwrap_or_default();
            println!("Blog created: {}", blog.id);
        }
        Demo::Read { id } => match client.read_blog(ReadBlogRequest { blog_id: id }).await {
            Ok(res) => {
                let blog = res.into_inner().blog.unwrap_or_default();
                println!(
                    "Blog {}: [{}] {} - {}",
                    blog.id, blog.author_id, blog.title, blog.content
                );
            }
            Err(status) if status.code() == Code::InvalidArgument => {
                println!("Invalid id: {}", status.message());
            }
            Err(status) if status.code() == Code::NotFound => {
                println!("Not found: {}", status.message());
            }
            Err(status) => bail!("ReadBlog RPC error: {status}"),
        },
        Demo::Update {
            id,
            author,
            title,
            content,
        } => {
            let res = client
                .update_blog(UpdateBlogRequest {
                    blog: Some(Blog {
                        id,
                        author_id: author,
                        title,
                        content,
                    }),
                })
                .await?;
            let blog = res.into_inner().blog.unwrap_or_default();
            println!("Blog updated: [{}] {}", blog.author_id, blog.title);
        }
        Demo::Delete { id } => {
            let res = client.delete_blog(DeleteBlogRequest { blog_id: id }).await?;
            println!("Blog deleted: {}", res.into_inner().blog_id);
        }
        Demo::List => {
            let mut stream = client.list_blog(ListBlogRequest {}).await?.into_inner();

            let (count, result) = drain(&mut stream, |res| {
                let blog = res.blog.unwrap_or_default();
                println!("{}: [{}] {}", blog.id, blog.author_id, blog.title);
            })
            .await;
            result.with_context(|| format!("list stream broke after {count} blogs"))?;
            println!("{count} blogs listed");
        }
    }

    Ok(())
}
