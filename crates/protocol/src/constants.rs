use std::time::Duration;

/// Member API endpoint that negotiates part size, parallelism and tokens.
pub const NEGOTIATE_URL: &str = "https://member.acfun.cn/video/api/getKSCloudToken";

/// Member API endpoint that marks all fragments as delivered.
pub const FINISH_URL: &str = "https://member.acfun.cn/video/api/uploadFinish";

/// Member API endpoint that registers the uploaded blob as a video.
pub const COMMIT_URL: &str = "https://member.acfun.cn/video/api/createVideo";

/// Media cloud endpoint receiving raw fragment bytes.
pub const FRAGMENT_URL: &str = "https://mediacloud.kuaishou.com/api/upload/fragment";

/// Per-request timeout for every remote call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Upload template requested during negotiation.
pub const UPLOAD_TEMPLATE: &str = "1";

/// Storage backend named when committing the artifact.
pub const VOD_TYPE: &str = "ksCloud";

/// Origin sent with member API requests.
pub const ORIGIN: &str = "https://member.acfun.cn";

/// Referer sent with member API requests.
pub const REFERER: &str = "https://member.acfun.cn/upload-video";

/// Browser user agent the member API expects.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_3) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.149 Safari/537.36";
