use std::{fs, io::BufReader, net::SocketAddr, sync::Arc};

use {
    axum::{extract::Request, Extension, Router},
    hyper::body::Incoming,
    hyper_util::{
        rt::{TokioExecutor, TokioIo},
        server::conn::auto::Builder as AutoBuilder,
    },
    pki_types::{CertificateDer, PrivateKeyDer},
    rustls_pemfile as pemfile,
    tokio::net::{TcpListener, TcpStream},
    tokio_rustls::{rustls::ServerConfig, TlsAcceptor},
    tower::ServiceExt,
    tracing::{debug, error, warn},
};

use crate::{auth::SecureTransport, util::SslConfig, AppError};

pub fn create_tls_acceptor(ssl_config: &SslConfig) -> Result<TlsAcceptor, AppError> {
    debug!("Creating TLS Acceptor with SSL Config: {:?}", ssl_config);

    let cert_file = fs::File::open(&ssl_config.cert_path).map_err(|e| {
        error!("Failed to open certificate file: {:?}", e);
        AppError::IoError(e)
    })?;
    let mut cert_reader = BufReader::new(cert_file);

    let cert_chain = pemfile::certs(&mut cert_reader)
        .collect::<Result<Vec<CertificateDer<'static>>, _>>()
        .map_err(|e| {
            error!("Failed to read certificates from PEM file: {:?}", e);
            AppError::InvalidCertificate(ssl_config.cert_path.clone())
        })?;

    let key_file = fs::File::open(&ssl_config.key_path)?;
    let mut key_reader = BufReader::new(key_file);

    let private_key: PrivateKeyDer<'static> = pemfile::private_key(&mut key_reader)
        .map_err(|e| AppError::InvalidPrivateKey {
            file_path: ssl_config.key_path.clone(),
            error: e.to_string(),
        })?
        .ok_or_else(|| {
            error!("No private key found in key file: {}", ssl_config.key_path);
            AppError::InvalidPrivateKey {
                file_path: ssl_config.key_path.clone(),
                error: "The file does not contain a PKCS#1, PKCS#8 or SEC1 private key."
                    .to_string(),
            }
        })?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(cert_chain, private_key)?;

    debug!("TLS Acceptor created successfully");
    Ok(TlsAcceptor::from(Arc::new(config)))
}

/// Binds `addr`, failing fast when the port is taken.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener, AppError> {
    TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind {}: {}", addr, e);
        AppError::IoError(e)
    })
}

pub async fn serve_https(tcp_listener: TcpListener, router: Router, tls_acceptor: TlsAcceptor) {
    debug!("Serving HTTPS on {:?}", tcp_listener.local_addr());

    // Lets the authorization request store see that the browser used TLS.
    let router = router.layer(Extension(SecureTransport));

    loop {
        match tcp_listener.accept().await {
            Ok((stream, remote_addr)) => {
                let acceptor = tls_acceptor.clone();
                let router = router.clone();
                tokio::task::spawn(async move {
                    match acceptor.accept(stream).await {
                        Ok(tls_stream) => serve_connection(TokioIo::new(tls_stream), router).await,
                        Err(err) => {
                            warn!("[client {remote_addr}] TLS handshake failed: {}", err)
                        }
                    }
                });
            }
            Err(err) => {
                warn!("Error accepting connection: {}", err);
            }
        }
    }
}

pub async fn serve_http(listener: TcpListener, router: Router) {
    debug!("Serving HTTP on {:?}", listener.local_addr());

    loop {
        match listener.accept().await {
            Ok((stream, _)) => {
                let router = router.clone();
                tokio::task::spawn(serve_plain(stream, router));
            }
            Err(e) => {
                error!("Failed to accept connection: {:?}", e);
            }
        }
    }
}

async fn serve_plain(stream: TcpStream, router: Router) {
    serve_connection(TokioIo::new(stream), router).await
}

async fn serve_connection<I>(io: TokioIo<I>, router: Router)
where
    I: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send + 'static,
{
    let service = hyper::service::service_fn(move |req: Request<Incoming>| {
        let router = router.clone();
        async move { router.oneshot(req).await }
    });

    if let Err(err) = AutoBuilder::new(TokioExecutor::new())
        .serve_connection(io, service)
        .await
    {
        error!("Error serving connection: {:?}", err);
    }
}
