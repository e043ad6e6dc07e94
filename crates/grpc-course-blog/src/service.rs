//! gRPC handlers for the blog service.
//!
//! Four unary CRUD endpoints plus a server-streaming `ListBlog`. All of
//! them run against the [`DocumentStore`] handle injected at construction.
//! Error mapping follows the wire taxonomy: an unparsable id is
//! `InvalidArgument`, a well-formed id with no document behind it is
//! `NotFound`, and backend failures are `Internal` - the first two must
//! stay distinguishable for clients.
//!
//! `UpdateBlog` reads the full document, mutates its fields and persists it
//! by id, so an update of an absent document fails with `NotFound` before
//! anything is written.

use crate::store::{BlogDocument, DocumentId, DocumentStore, StoreError};
use core::pin::Pin;
use futures::StreamExt;
use grpc_course_core::Error;
use grpc_course_core::proto::blog::{
    Blog, CreateBlogRequest, CreateBlogResponse, DeleteBlogRequest, DeleteBlogResponse,
    ListBlogRequest, ListBlogResponse, ReadBlogRequest, ReadBlogResponse, UpdateBlogRequest,
    UpdateBlogResponse, blog_service_server,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::ReceiverStream};
use tonic::{Request, Response, Status};

/// Blog service handler with its injected store handle.
#[derive(Clone)]
pub struct BlogService {
    store: Arc<dyn DocumentStore>,
}

impl BlogService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }
}

fn parse_id(raw: &str) -> Result<DocumentId, Status> {
    DocumentId::parse(raw).map_err(|e| {
        Error::InvalidArgument {
            reason: e.to_string(),
        }
        .into()
    })
}

fn map_store_err(id: DocumentId, err: StoreError) -> Status {
    match err {
        StoreError::NotFound => Error::NotFound {
            what: format!("blog with id {id} not found"),
        }
        .into(),
        StoreError::Backend { context } => Error::Internal { context }.into(),
    }
}

fn to_proto(doc: BlogDocument) -> Blog {
    Blog {
        id: doc.id.to_string(),
        author_id: doc.author_id,
        title: doc.title,
        content: doc.content,
    }
}

#[tonic::async_trait]
impl blog_service_server::BlogService for BlogService {
    async fn create_blog(
        &self,
        req: Request<CreateBlogRequest>,
    ) -> Result<Response<CreateBlogResponse>, Status> {
        tracing::info!("CreateBlog invoked");
        let blog = req.into_inner().blog.unwrap_or_default();

        let doc = BlogDocument {
            id: DocumentId::generate(),
            author_id: blog.author_id.clone(),
            title: blog.title.clone(),
            content: blog.content.clone(),
        };

        let id = self
            .store
            .insert_one(doc)
            .await
            .map_err(|e| match e {
                StoreError::Backend { context } => Status::from(Error::Internal { context }),
                StoreError::NotFound => Status::from(Error::Internal {
                    context: "insert reported not-found".to_string(),
                }),
            })?;

        Ok(Response::new(CreateBlogResponse {
            blog: Some(Blog {
                id: id.to_string(),
                author_id: blog.author_id,
                title: blog.title,
                content: blog.content,
            }),
        }))
    }

    async fn read_blog(
        &self,
        req: Request<ReadBlogRequest>,
    ) -> Result<Response<ReadBlogResponse>, Status> {
        tracing::info!("ReadBlog invoked");
        let id = parse_id(&req.get_ref().blog_id)?;

        let doc = self
            .store
            .find_one(id)
            .await
            .map_err(|e| map_store_err(id, e))?;

        Ok(Response::new(ReadBlogResponse {
            blog: Some(to_proto(doc)),
        }))
    }

    async fn update_blog(
        &self,
        req: Request<UpdateBlogRequest>,
    ) -> Result<Response<UpdateBlogResponse>, Status> {
        tracing::info!("UpdateBlog invoked");
        let blog = req.into_inner().blog.unwrap_or_default();
        let id = parse_id(&blog.id)?;

        // Read the full document, mutate its fields, persist by id.
        let mut doc = self
            .store
            .find_one(id)
            .await
            .map_err(|e| map_store_err(id, e))?;

        doc.author_id = blog.author_id;
        doc.title = blog.title;
        doc.content = blog.content;

        self.store
            .replace_one(id, doc.clone())
            .await
            .map_err(|e| map_store_err(id, e))?;

        Ok(Response::new(UpdateBlogResponse {
            blog: Some(to_proto(doc)),
        }))
    }

    async fn delete_blog(
        &self,
        req: Request<DeleteBlogRequest>,
    ) -> Result<Response<DeleteBlogResponse>, Status> {
        tracing::info!("DeleteBlog invoked");
        let id = parse_id(&req.get_ref().blog_id)?;

        self.store
            .delete_one(id)
            .await
            .map_err(|e| map_store_err(id, e))?;

        Ok(Response::new(DeleteBlogResponse {
            blog_id: id.to_string(),
        }))
    }

    type ListBlogStream = Pin<Box<dyn Stream<Item = Result<ListBlogResponse, Status>> + Send>>;

    async fn list_blog(
        &self,
        _req: Request<ListBlogRequest>,
    ) -> Result<Response<Self::ListBlogStream>, Status> {
        tracing::info!("ListBlog invoked");
        let mut cursor = self.store.find_all();
        let (tx, rx) = mpsc::channel(16);

        tokio::spawn(async move {
            while let Some(next) = cursor.next().await {
                let item = match next {
                    Ok(doc) => Ok(ListBlogResponse {
                        blog: Some(to_proto(doc)),
                    }),
                    Err(e) => Err(Status::from(Error::Internal {
                        context: e.to_string(),
                    })),
                };
                let stop = item.is_err();
                if tx.send(item).await.is_err() || stop {
                    break;
                }
            }
        });

        Ok(Response::new(Box::pin(ReceiverStream::new(rx))))
    }
}

#[cfg(test)]
mod tests {
    use super::blog_service_server::BlogService as _;
    use super::*;
    use crate::store::MemoryStore;
    use tonic::Code;

    fn service() -> BlogService {
        BlogService::new(Arc::new(MemoryStore::default()))
    }

    fn blog(id: &str, author: &str, title: &str, content: &str) -> Blog {
        Blog {
            id: id.to_string(),
            author_id: author.to_string(),
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    async fn create(svc: &BlogService, author: &str, title: &str, content: &str) -> Blog {
        svc.create_blog(Request::new(CreateBlogRequest {
            blog: Some(blog("", author, title, content)),
        }))
        .await
        .unwrap()
        .into_inner()
        .blog
        .unwrap()
    }

    #[tokio::test]
    async fn create_then_read_round_trips_all_fields() {
        let svc = service();
        let created = create(&svc, "author-1", "First post", "Hello world").await;
        assert_eq!(created.id.len(), 24);

        let read = svc
            .read_blog(Request::new(ReadBlogRequest {
                blog_id: created.id.clone(),
            }))
            .await
            .unwrap()
            .into_inner()
            .blog
            .unwrap();

        // Same fields back, with only the identifier added at create time.
        assert_eq!(read, created);
        assert_eq!(read.author_id, "author-1");
        assert_eq!(read.title, "First post");
        assert_eq!(read.content, "Hello world");
    }

    #[tokio::test]
    async fn malformed_and_absent_ids_fail_differently() {
        let svc = service();

        let malformed = svc
            .read_blog(Request::new(ReadBlogRequest {
                blog_id: "not-an-id".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(malformed.code(), Code::InvalidArgument);

        let absent = svc
            .read_blog(Request::new(ReadBlogRequest {
                blog_id: "0123456789abcdef01234567".to_string(),
            }))
            .await
            .unwrap_err();
        assert_eq!(absent.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn update_mutates_fields_and_keeps_the_id() {
        let svc = service();
        let created = create(&svc, "author-1", "Old title", "Old content").await;

        let updated = svc
            .update_blog(Request::new(UpdateBlogRequest {
                blog: Some(blog(&created.id, "author-2", "New title", "New content")),
            }))
            .await
            .unwrap()
            .into_inner()
            .blog
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.author_id, "author-2");
        assert_eq!(updated.title, "New title");

        let read = svc
            .read_blog(Request::new(ReadBlogRequest {
                blog_id: created.id,
            }))
            .await
            .unwrap()
            .into_inner()
            .blog
            .unwrap();
        assert_eq!(read, updated);
    }

    #[tokio::test]
    async fn update_of_an_absent_document_is_not_found() {
        let svc = service();
        let status = svc
            .update_blog(Request::new(UpdateBlogRequest {
                blog: Some(blog(
                    "0123456789abcdef01234567",
                    "author",
                    "title",
                    "content",
                )),
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn delete_then_read_is_not_found() {
        let svc = service();
        let created = create(&svc, "author", "title", "content").await;

        let deleted = svc
            .delete_blog(Request::new(DeleteBlogRequest {
                blog_id: created.id.clone(),
            }))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(deleted.blog_id, created.id);

        let status = svc
            .read_blog(Request::new(ReadBlogRequest {
                blog_id: created.id,
            }))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn list_streams_every_created_blog() {
        let svc = service();
        for n in 0..3 {
            create(&svc, "author", &format!("post {n}"), "content").await;
        }

        let mut stream = svc
            .list_blog(Request::new(ListBlogRequest {}))
            .await
            .unwrap()
            .into_inner();

        let mut titles = Vec::new();
        while let Some(next) = stream.next().await {
            titles.push(next.unwrap().blog.unwrap().title);
        }
        assert_eq!(titles.len(), 3);
    }
}
